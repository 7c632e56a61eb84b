//! Symbolic antiderivatives.
//!
//! `integrate` shrinks the integrand and tries, in order: a symbol-free integrand, linearity,
//! pulling out symbol-free factors, the table of elementary forms, reduction formulas for
//! powers and products of circular functions, rational functions,
//! u-substitution, expansion of products of sums, factoring of sums and integration by parts.
//! When the shrunk integrand has no antiderivative the integrand as written is tried once more.

mod parts;
mod rational;
mod reduction;
mod substitution;
mod table;
mod types;

use tracing::{debug, trace};

pub use parts::{
    is_algebraic, is_exponential, is_inverse_trigonometric, is_logarithmic, is_trigonometric,
    order_for_ilate,
};
pub use substitution::{choose, substitute, unfindable_substitution};
pub use types::{IntegrationResult, Strategy, Substitution};

use crate::config::IntegrateOptions;
use crate::expr::{div, one, product, sub, sum, Expr, Node, Operator};
use crate::factor::factor;
use crate::simplify::{
    convert_subtract_to_add, distribute_like_a_madman, factors_of, shrunk, times,
};

/// Antiderivative of `expr` in `symbol` with default options. No constant of integration is
/// added.
pub fn integrate(expr: &Expr, symbol: &str) -> IntegrationResult {
    integrate_with(expr, symbol, &IntegrateOptions::default())
}

pub fn integrate_with(expr: &Expr, symbol: &str, options: &IntegrateOptions) -> IntegrationResult {
    let integrand = shrunk(expr.clone());
    let integrator = Integrator {
        var: symbol,
        options,
    };
    let found = integrator.integral(&integrand, 0, true).or_else(|| {
        (&integrand != expr)
            .then(|| integrator.integral(expr, 0, true))
            .flatten()
    });
    match found {
        Some((raw, strategy)) => {
            let result = shrunk(raw);
            if result.is_nan() {
                debug!(target: "integrate", %integrand, "antiderivative folded to NaN");
                return IntegrationResult::NotFound;
            }
            debug!(target: "integrate", %integrand, %result, ?strategy, "integrated");
            IntegrationResult::Integrated { result, strategy }
        }
        None => {
            debug!(target: "integrate", %integrand, symbol, "no antiderivative found");
            IntegrationResult::NotFound
        }
    }
}

fn split_free(expr: Expr, symbol: &str) -> (Expr, Expr) {
    let (free, bound): (Vec<Expr>, Vec<Expr>) = factors_of(expr)
        .into_iter()
        .partition(|f| !f.find_identifier(symbol));
    (product(free), product(bound))
}

struct Integrator<'a> {
    var: &'a str,
    options: &'a IntegrateOptions,
}

impl Integrator<'_> {
    fn integral(&self, expr: &Expr, depth: usize, parts_allowed: bool) -> Option<(Expr, Strategy)> {
        if depth > self.options.max_depth {
            trace!(target: "integrate", %expr, depth, "depth limit");
            return None;
        }
        if !expr.find_identifier(self.var) {
            return Some((times(expr.clone(), Expr::ident(self.var)), Strategy::Table));
        }
        if let Expr::Node(Node { operator, operands }) = expr {
            match (operator, operands.as_slice()) {
                (Operator::Add, terms) => {
                    let integrated = terms
                        .iter()
                        .map(|t| Some(self.integral(t, depth, parts_allowed)?.0))
                        .collect::<Option<Vec<_>>>();
                    if let Some(integrated) = integrated {
                        return Some((sum(integrated), Strategy::Linearity));
                    }
                }
                (Operator::Subtract, [a, b]) => {
                    let integrated = self.integral(a, depth, parts_allowed).and_then(|(a, _)| {
                        Some(sub(a, self.integral(b, depth, parts_allowed)?.0))
                    });
                    if let Some(integrated) = integrated {
                        return Some((integrated, Strategy::Linearity));
                    }
                }
                _ => {}
            }
        }
        if let Some((constant, inner)) = self.split_constant(expr) {
            let (integrated, _) = self.integral(&inner, depth, parts_allowed)?;
            return Some((times(constant, integrated), Strategy::ConstantMultiple));
        }
        if let Some(found) = table::lookup(expr, self.var) {
            return Some((found, Strategy::Table));
        }
        if let Some(found) = self
            .by_reduction(expr, depth)
            .or_else(|| self.by_product_to_sum(expr, depth))
        {
            return Some((found, Strategy::Reduction));
        }
        if let Some(found) = self.rational(expr, depth) {
            return Some((found, Strategy::RationalFunction));
        }
        if let Some(found) = self.by_substitution(expr, depth) {
            return Some((found, Strategy::Substitution));
        }
        if let Some(found) = self.by_expansion(expr, depth, parts_allowed) {
            return Some((found, Strategy::Expansion));
        }
        if let Some(found) = self.by_factoring(expr, depth, parts_allowed) {
            return Some((found, Strategy::Factoring));
        }
        if parts_allowed {
            if let Some(found) = self.by_parts(expr, depth) {
                return Some((found, Strategy::ByParts));
            }
        }
        trace!(target: "integrate", %expr, depth, "no strategy applies");
        None
    }

    fn split_constant(&self, expr: &Expr) -> Option<(Expr, Expr)> {
        let free = |e: &Expr| !e.find_identifier(self.var);
        match expr.operator()? {
            Operator::Multiply => {
                let (constant, inner) = split_free(expr.clone(), self.var);
                (!constant.is_one()).then_some((constant, inner))
            }
            Operator::Divide => {
                let (numerator, denominator) = expr.binary(Operator::Divide)?;
                if free(denominator) {
                    Some((div(one(), denominator.clone()), numerator.clone()))
                } else if free(numerator) && !numerator.is_one() {
                    Some((numerator.clone(), div(one(), denominator.clone())))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn by_substitution(&self, expr: &Expr, depth: usize) -> Option<Expr> {
        for candidate in choose(expr, self.var, self.options.max_substitution_candidates) {
            let Some(found) = substitute(expr, self.var, &candidate) else {
                continue;
            };
            let inner = Integrator {
                var: &found.symbol,
                options: self.options,
            };
            if let Some((antiderivative, _)) = inner.integral(&found.integrand, depth + 1, true) {
                trace!(target: "integrate", %candidate, %antiderivative, "substituted back");
                let (back, _) = antiderivative.replace_identifier(&found.symbol, &candidate);
                return Some(times(found.scale, back));
            }
        }
        None
    }

    /// Pulls the factor shared by every term out of a sum whose terms do not integrate
    /// separately, then tries substitution and parts on the product.
    fn by_factoring(&self, expr: &Expr, depth: usize, parts_allowed: bool) -> Option<Expr> {
        if !expr.is_op(Operator::Add) && !expr.is_op(Operator::Subtract) {
            return None;
        }
        let (additive, _) = convert_subtract_to_add(expr.clone());
        let (factored, changed) = factor(additive);
        if !changed || factored.is_op(Operator::Add) {
            return None;
        }
        trace!(target: "integrate", %expr, %factored, "factored sum");
        self.by_substitution(&factored, depth + 1).or_else(|| {
            parts_allowed
                .then(|| self.by_parts(&factored, depth + 1))
                .flatten()
        })
    }

    fn by_expansion(&self, expr: &Expr, depth: usize, parts_allowed: bool) -> Option<Expr> {
        let (expanded, changed) = distribute_like_a_madman(expr.clone());
        if !changed {
            return None;
        }
        let expanded = shrunk(expanded);
        let is_sum = expanded.is_op(Operator::Add) || expanded.is_op(Operator::Subtract);
        if !is_sum || &expanded == expr {
            return None;
        }
        Some(self.integral(&expanded, depth + 1, parts_allowed)?.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn integrated(input: &str) -> Option<String> {
        let expr = parse_expr(input).expect("parse input");
        integrate(&expr, "x").into_result().map(|e| e.to_string())
    }

    #[test]
    fn constants_integrate_to_a_multiple_of_the_symbol() {
        assert_eq!(integrated("3").as_deref(), Some("3x"));
    }

    #[test]
    fn reciprocal() {
        assert_eq!(integrated("1 / x").as_deref(), Some("ln(abs(x))"));
    }

    #[test]
    fn self_power_has_no_antiderivative() {
        let expr = parse_expr("x^x").expect("parse input");
        assert_eq!(integrate(&expr, "x"), IntegrationResult::NotFound);
    }

    #[test]
    fn strategy_is_reported() {
        let expr = parse_expr("e^x * sin(x)").expect("parse input");
        match integrate(&expr, "x") {
            IntegrationResult::Integrated { strategy, .. } => {
                assert_eq!(strategy, Strategy::ByParts)
            }
            IntegrationResult::NotFound => panic!("expected an antiderivative"),
        }
    }
}
