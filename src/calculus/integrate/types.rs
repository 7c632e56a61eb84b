use crate::expr::Expr;

/// Technique that produced the outermost step of an antiderivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Symbol-free integrand or a closed form from the table.
    Table,
    /// Term-by-term integration of a sum or difference.
    Linearity,
    /// A symbol-free factor pulled out of a product or quotient.
    ConstantMultiple,
    /// A power or product of circular or hyperbolic functions lowered by an identity.
    Reduction,
    RationalFunction,
    Substitution,
    ByParts,
    /// Products of sums multiplied out before integrating termwise.
    Expansion,
    /// A common factor pulled out of a sum whose terms do not integrate separately.
    Factoring,
}

/// Outcome of `integrate`; `NotFound` is an ordinary answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationResult {
    Integrated { result: Expr, strategy: Strategy },
    NotFound,
}

impl IntegrationResult {
    pub fn result(&self) -> Option<&Expr> {
        match self {
            IntegrationResult::Integrated { result, .. } => Some(result),
            IntegrationResult::NotFound => None,
        }
    }

    pub fn into_result(self) -> Option<Expr> {
        match self {
            IntegrationResult::Integrated { result, .. } => Some(result),
            IntegrationResult::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, IntegrationResult::Integrated { .. })
    }
}

/// A u-substitution: the integrand rewritten in `symbol`, where `symbol` stands for `candidate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub candidate: Expr,
    pub symbol: String,
    /// Symbol-free factor split off the rewritten integrand.
    pub scale: Expr,
    pub integrand: Expr,
}
