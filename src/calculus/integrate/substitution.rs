use tracing::trace;

use super::split_free;
use super::types::Substitution;
use crate::calculus::derive;
use crate::expr::{div, sub, Expr, Node, Operator};
use crate::polynomial::Polynomial;
use crate::simplify::{shrunk, split_coefficient, with_coefficient};

/// Candidate inner expressions `u` for a substitution, outermost first: symbol-dependent
/// calls and their arguments, bases and exponents of powers, exponentials, and denominators.
/// The bare symbol itself is never a candidate.
pub fn choose(expr: &Expr, symbol: &str, limit: usize) -> Vec<Expr> {
    let mut found = Vec::new();
    collect(expr, symbol, &mut found);
    found.truncate(limit);
    found
}

fn collect(expr: &Expr, symbol: &str, found: &mut Vec<Expr>) {
    let push = |candidate: &Expr, found: &mut Vec<Expr>| {
        if candidate.find_identifier(symbol)
            && !candidate.is_identifier(symbol)
            && !found.contains(candidate)
        {
            found.push(candidate.clone());
        }
    };
    match expr {
        Expr::Call(call) => {
            push(expr, found);
            for arg in &call.args {
                push(arg, found);
            }
        }
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) if operands.len() == 2 => {
            let (base, exponent) = (&operands[0], &operands[1]);
            if !base.find_identifier(symbol) {
                push(expr, found);
            }
            push(base, found);
            push(exponent, found);
        }
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) if operands.len() == 2 => push(&operands[1], found),
        _ => {}
    }
    for child in expr.children() {
        collect(child, symbol, found);
    }
}

fn fresh_symbol(expr: &Expr) -> String {
    let taken = expr.identifiers();
    std::iter::once("u".to_string())
        .chain((1..).map(|i| format!("u{i}")))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| "u".to_string())
}

/// Rewrites `expr dx` as `g(u) du` with `u = candidate`.
///
/// Occurrences of `candidate` are replaced by the new symbol and the integrand is divided by
/// `du/dx`; when that leaves the old symbol behind the division is retried before replacing.
/// A leftover occurrence of `symbol` is eliminated by solving `u = ax + b` for `x` when the
/// candidate is linear; otherwise the substitution does not apply.
pub fn substitute(expr: &Expr, symbol: &str, candidate: &Expr) -> Option<Substitution> {
    let slope = derive(candidate, symbol).ok()?;
    if slope.is_zero() || slope.is_nan() {
        return None;
    }
    let fresh = fresh_symbol(expr);
    let u = Expr::ident(fresh.as_str());
    let (replaced, _) = expr.clone().replace(candidate, &u);
    let rewritten = eliminate(shrunk(div(replaced, slope.clone())), candidate, symbol, &u)
        .or_else(|| {
            let ratio = shrunk(div(expr.clone(), slope));
            eliminate(ratio.replace(candidate, &u).0, candidate, symbol, &u)
        })?;
    let (coefficient, rest) = split_coefficient(rewritten);
    let (free, integrand) = split_free(rest, &fresh);
    let scale = with_coefficient(coefficient, free);
    trace!(target: "integrate", %candidate, %integrand, "substitution applies");
    Some(Substitution {
        candidate: candidate.clone(),
        symbol: fresh,
        scale,
        integrand,
    })
}

fn eliminate(rewritten: Expr, candidate: &Expr, symbol: &str, u: &Expr) -> Option<Expr> {
    let rewritten = if rewritten.find_identifier(symbol) {
        let inverse = linear_inverse(candidate, symbol, u)?;
        shrunk(rewritten.replace_identifier(symbol, &inverse).0)
    } else {
        shrunk(rewritten)
    };
    (!rewritten.find_identifier(symbol) && !rewritten.is_nan()).then_some(rewritten)
}

fn linear_inverse(candidate: &Expr, symbol: &str, u: &Expr) -> Option<Expr> {
    let poly = Polynomial::<Expr>::from_expr(candidate, symbol)?;
    if poly.degree() != Some(1) {
        return None;
    }
    let slope = poly.coeff(1);
    let offset = poly.coeff(0);
    Some(div(sub(u.clone(), offset), slope))
}

/// True when no candidate of `choose` yields a substitution.
pub fn unfindable_substitution(expr: &Expr, symbol: &str, limit: usize) -> bool {
    choose(expr, symbol, limit)
        .iter()
        .all(|candidate| substitute(expr, symbol, candidate).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn candidates_skip_the_bare_symbol() {
        let expr = parse_expr("2x * cos(x^2)").expect("parse input");
        let found: Vec<String> = choose(&expr, "x", 8).iter().map(|c| c.to_string()).collect();
        assert_eq!(found, vec!["cos(x^2)", "x^2"]);
    }

    #[test]
    fn chain_rule_factor_disappears() {
        let expr = parse_expr("2x * cos(x^2)").expect("parse input");
        let candidate = parse_expr("x^2").expect("parse input");
        let found = substitute(&expr, "x", &candidate).expect("substitution");
        assert_eq!(found.integrand.to_string(), "cos(u)");
        assert!(found.scale.is_one());
    }

    #[test]
    fn constant_multiple_of_the_derivative() {
        let expr = parse_expr("x / (x^2 + 1)").expect("parse input");
        let candidate = parse_expr("x^2 + 1").expect("parse input");
        let found = substitute(&expr, "x", &candidate).expect("substitution");
        assert_eq!(found.integrand.to_string(), "1 / u");
        assert_eq!(found.scale.to_string(), "1 / 2");
    }

    #[test]
    fn no_candidate_for_self_power() {
        let expr = parse_expr("x^x").expect("parse input");
        assert!(unfindable_substitution(&expr, "x", 24));
    }
}
