use tracing::trace;

use super::{split_free, Integrator};
use crate::calculus::derive;
use crate::expr::{div, one, product, rational_expr, sub, zero, Expr, Function, Operator};
use crate::polynomial::degree;
use crate::simplify::{factors_of, shrunk, split_coefficient, times, with_coefficient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum IlateRank {
    InverseTrigonometric,
    Logarithmic,
    Algebraic,
    Trigonometric,
    Exponential,
}

fn call_matching(expr: &Expr, predicate: impl Fn(&Function) -> bool) -> bool {
    matches!(expr, Expr::Call(call) if predicate(&call.function))
}

pub fn is_inverse_trigonometric(expr: &Expr) -> bool {
    call_matching(expr, Function::is_inverse_trigonometric)
}

pub fn is_logarithmic(expr: &Expr) -> bool {
    call_matching(expr, Function::is_logarithmic)
}

/// Polynomials in `symbol`, powers of it with a free exponent, and roots of either.
pub fn is_algebraic(expr: &Expr, symbol: &str) -> bool {
    if degree(expr, &[symbol]).is_some() {
        return true;
    }
    if let Some((base, exponent)) = expr.binary(Operator::Raise) {
        return base.is_identifier(symbol) && !exponent.find_identifier(symbol);
    }
    expr.as_unary(&Function::Sqrt)
        .is_some_and(|radicand| is_algebraic(radicand, symbol))
}

/// Circular and hyperbolic calls, alone or raised to a number.
pub fn is_trigonometric(expr: &Expr) -> bool {
    let circular = |f: &Function| f.is_trigonometric() || f.is_hyperbolic();
    match expr.binary(Operator::Raise) {
        Some((base, Expr::Number(_))) => call_matching(base, circular),
        _ => call_matching(expr, circular),
    }
}

/// A free base raised to an exponent that depends on `symbol`.
pub fn is_exponential(expr: &Expr, symbol: &str) -> bool {
    expr.binary(Operator::Raise).is_some_and(|(base, exponent)| {
        !base.find_identifier(symbol) && exponent.find_identifier(symbol)
    })
}

fn integer_power_base(expr: &Expr) -> &Expr {
    match expr.binary(Operator::Raise) {
        Some((base, Expr::Number(n))) if n.is_integer() && !n.is_negative() => base,
        _ => expr,
    }
}

fn ilate_rank(expr: &Expr, symbol: &str) -> Option<IlateRank> {
    let base = integer_power_base(expr);
    if is_inverse_trigonometric(base) {
        Some(IlateRank::InverseTrigonometric)
    } else if is_logarithmic(base) {
        Some(IlateRank::Logarithmic)
    } else if is_algebraic(expr, symbol) {
        Some(IlateRank::Algebraic)
    } else if is_trigonometric(expr) {
        Some(IlateRank::Trigonometric)
    } else if is_exponential(expr, symbol) {
        Some(IlateRank::Exponential)
    } else {
        None
    }
}

/// Orders two factors as `(u, dv)` by ILATE; on a tie the first factor is `u`.
pub fn order_for_ilate(first: &Expr, second: &Expr, symbol: &str) -> Option<(Expr, Expr)> {
    let a = ilate_rank(first, symbol)?;
    let b = ilate_rank(second, symbol)?;
    if b < a {
        Some((second.clone(), first.clone()))
    } else {
        Some((first.clone(), second.clone()))
    }
}

fn choose_parts(expr: &Expr, symbol: &str) -> Option<(Expr, Expr)> {
    let mut factors = factors_of(expr.clone());
    match factors.len() {
        0 => None,
        1 => {
            let rank = ilate_rank(&factors[0], symbol)?;
            (rank <= IlateRank::Logarithmic).then(|| (factors.remove(0), one()))
        }
        2 => order_for_ilate(&factors[0], &factors[1], symbol),
        _ => {
            let ranks = factors
                .iter()
                .map(|f| ilate_rank(f, symbol))
                .collect::<Option<Vec<_>>>()?;
            let best = (0..ranks.len()).min_by_key(|&i| ranks[i])?;
            let u = factors.remove(best);
            Some((u, product(factors)))
        }
    }
}

impl Integrator<'_> {
    /// `∫ u dv = u v - ∫ v du`, repeated while the leftover integral needs it. When a leftover
    /// integral is a constant multiple of the integrand the equation is solved for it.
    pub(super) fn by_parts(&self, expr: &Expr, depth: usize) -> Option<Expr> {
        let (known, multiple) = self.parts_chain(expr, expr, depth)?;
        let multiple = shrunk(multiple);
        if multiple.is_zero() {
            return Some(known);
        }
        let divisor = shrunk(sub(one(), multiple));
        if divisor.is_zero() || divisor.is_nan() {
            return None;
        }
        Some(div(known, divisor))
    }

    fn parts_chain(&self, expr: &Expr, original: &Expr, depth: usize) -> Option<(Expr, Expr)> {
        if depth > self.options.max_depth {
            return None;
        }
        let (u, dv) = choose_parts(expr, self.var)?;
        let (v, _) = self.integral(&dv, depth + 1, false)?;
        let du = derive(&u, self.var).ok()?;
        let boundary = product(vec![u, v.clone()]);
        let residual = shrunk(product(vec![v, du]));
        trace!(target: "integrate", %boundary, %residual, depth, "by parts");

        if residual.is_zero() {
            return Some((boundary, zero()));
        }
        if let Some(k) = self.multiple_of(&residual, original) {
            return Some((boundary, k.negate()));
        }
        if let Some((rest, _)) = self.integral(&residual, depth + 1, false) {
            return Some((sub(boundary, rest), zero()));
        }
        let (coefficient, rest) = split_coefficient(residual);
        let (free, inner) = split_free(rest, self.var);
        let scale = with_coefficient(coefficient, free);
        let (known, multiple) = self.parts_chain(&inner, original, depth + 1)?;
        Some((
            sub(boundary, times(scale.clone(), known)),
            times(scale.negate(), multiple),
        ))
    }

    fn multiple_of(&self, residual: &Expr, original: &Expr) -> Option<Expr> {
        let (k, rest) = split_coefficient(residual.clone());
        let (j, other) = split_coefficient(original.clone());
        if rest == other && !j.is_zero() {
            return Some(rational_expr(&k.div(&j)));
        }
        let ratio = shrunk(div(residual.clone(), original.clone()));
        (!ratio.find_identifier(self.var) && !ratio.is_nan() && !ratio.is_zero()).then_some(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn parsed(input: &str) -> Expr {
        parse_expr(input).expect("parse input")
    }

    #[test]
    fn ilate_prefers_logarithms_over_powers() {
        let (u, dv) = order_for_ilate(&parsed("x^2"), &parsed("ln(x)"), "x").expect("ranked");
        assert_eq!(u.to_string(), "ln(x)");
        assert_eq!(dv.to_string(), "x^2");
    }

    #[test]
    fn exponentials_come_last() {
        let (u, _) = order_for_ilate(&parsed("e^x"), &parsed("sin(x)"), "x").expect("ranked");
        assert_eq!(u.to_string(), "sin(x)");
    }

    #[test]
    fn classification() {
        assert!(is_algebraic(&parsed("x^3 + 1"), "x"));
        assert!(is_algebraic(&parsed("sqrt(x)"), "x"));
        assert!(!is_algebraic(&parsed("e^x"), "x"));
        assert!(is_exponential(&parsed("2^x"), "x"));
        assert!(is_trigonometric(&parsed("cosh(x)^2")));
        assert!(is_inverse_trigonometric(&parsed("atan(x)")));
        assert!(is_logarithmic(&parsed("ln(x)")));
    }

    #[test]
    fn powers_of_logarithms_rank_as_logarithms() {
        let (u, dv) = order_for_ilate(&parsed("x"), &parsed("ln(x)^2"), "x").expect("ranked");
        assert_eq!(u.to_string(), "ln(x)^2");
        assert_eq!(dv.to_string(), "x");
        let (u, dv) = choose_parts(&parsed("ln(x)^2"), "x").expect("chosen");
        assert_eq!(u.to_string(), "ln(x)^2");
        assert!(dv.is_one());
    }

    #[test]
    fn self_power_is_unranked() {
        assert_eq!(order_for_ilate(&parsed("x^x"), &parsed("x"), "x"), None);
    }
}
