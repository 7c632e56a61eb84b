use super::bottom_up;
use super::combine::{complex_quotient, split_power};
use super::structure::times;
use crate::expr::{as_rational, div, one, pow, product, rational_expr, sum, Expr, Node, Operator};
use crate::numeral::Numeral;

/// Cancels common factors between numerators and denominators.
///
/// Nested quotients are flattened, a quotient inside a product is hoisted over it, numeral
/// quotients are reduced to lowest terms, and equal bases net their exponents on one side.
pub fn cancel(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut cancel_node)
}

/// Cancels `numerator / denominator`; the flag reports whether anything changed.
pub fn cancel_top_and_bottom(numerator: Expr, denominator: Expr) -> (Expr, bool) {
    let (expr, outcome) = cancel_quotient(numerator, denominator);
    (expr, outcome.any())
}

/// Like `cancel_top_and_bottom`, but only reports a change when a base appeared on both sides.
pub(crate) fn cancel_counting_bases(numerator: Expr, denominator: Expr) -> (Expr, bool) {
    let (expr, outcome) = cancel_quotient(numerator, denominator);
    (expr, outcome.bases)
}

#[derive(Default)]
struct Outcome {
    structure: bool,
    coefficient: bool,
    bases: bool,
}

impl Outcome {
    fn any(&self) -> bool {
        self.structure || self.coefficient || self.bases
    }
}

fn cancel_node(expr: Expr) -> (Expr, bool) {
    match expr {
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([n, d]) => cancel_top_and_bottom(n, d),
            Err(operands) => (Expr::node(Operator::Divide, operands), false),
        },
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => hoist_quotient(operands),
        other => (other, false),
    }
}

pub(crate) fn factors_of(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => operands,
        other => vec![other],
    }
}

fn hoist_quotient(mut operands: Vec<Expr>) -> (Expr, bool) {
    let Some(position) = operands.iter().position(|op| op.binary(Operator::Divide).is_some())
    else {
        return (Expr::node(Operator::Multiply, operands), false);
    };
    let (numerator, denominator) = match operands.remove(position) {
        Expr::Node(Node { operands: parts, .. }) => match <[Expr; 2]>::try_from(parts) {
            Ok([n, d]) => (n, d),
            Err(_) => return (Expr::node(Operator::Multiply, operands), false),
        },
        _ => return (Expr::node(Operator::Multiply, operands), false),
    };
    let mut top: Vec<Expr> = operands.drain(..position).collect();
    top.extend(factors_of(numerator));
    top.extend(operands);
    top.retain(|f| !f.is_one());
    (div(product(top), denominator), true)
}

fn cancel_quotient(mut numerator: Expr, mut denominator: Expr) -> (Expr, Outcome) {
    let mut outcome = Outcome::default();
    loop {
        if let Some((a, b)) = numerator.binary(Operator::Divide) {
            let (a, b) = (a.clone(), b.clone());
            numerator = a;
            denominator = times(b, denominator);
            outcome.structure = true;
        } else if let Some((b, c)) = denominator.binary(Operator::Divide) {
            let (b, c) = (b.clone(), c.clone());
            numerator = times(numerator, c);
            denominator = b;
            outcome.structure = true;
        } else {
            break;
        }
    }

    if denominator.is_zero() {
        outcome.structure = true;
        return (div(Expr::nan(), one()), outcome);
    }
    if numerator.is_nan() {
        return (div(numerator, denominator), outcome);
    }
    if let Some(value) = complex_quotient(&numerator, &denominator) {
        outcome.coefficient = true;
        return (value, outcome);
    }

    if let (Expr::Number(n), Expr::Number(d)) = (&numerator, &denominator) {
        let value = n.div(d);
        let reduced = match value.as_rational() {
            Some(r) => div(Expr::integer(r.numer().clone()), Expr::integer(r.denom().clone())),
            None => Expr::Number(value),
        };
        outcome.coefficient = reduced != div(numerator.clone(), denominator.clone());
        return (reduced, outcome);
    }

    let top = split_factors(&numerator);
    let bottom = split_factors(&denominator);
    if top.coefficient.is_nan() || bottom.coefficient.is_nan() || bottom.coefficient.is_zero() {
        return (div(numerator, denominator), outcome);
    }

    let (top_coefficient, bottom_coefficient) =
        match (top.coefficient.as_rational(), bottom.coefficient.as_rational()) {
            (Some(_), Some(_)) => {
                let ratio = top.coefficient.div(&bottom.coefficient);
                match ratio.as_rational() {
                    Some(r) => (
                        Numeral::integer(r.numer().clone()),
                        Numeral::integer(r.denom().clone()),
                    ),
                    None => (ratio, Numeral::one()),
                }
            }
            _ => (top.coefficient.div(&bottom.coefficient), Numeral::one()),
        };
    outcome.coefficient = top_coefficient != top.coefficient
        || bottom_coefficient != bottom.coefficient;

    let mut top_factors: Vec<(Expr, Expr)> = Vec::new();
    let mut bottom_factors = bottom.powers;
    for (base, exponent) in top.powers {
        let Some(j) = bottom_factors.iter().position(|(b, _)| b == &base) else {
            top_factors.push((base, exponent));
            continue;
        };
        outcome.bases = true;
        let (_, lower) = bottom_factors.remove(j);
        match (as_rational(&exponent), as_rational(&lower)) {
            (Some(e1), Some(e2)) => {
                let net = e1.sub(&e2);
                if net.is_negative() {
                    bottom_factors.insert(j, (base, rational_expr(&net.neg())));
                } else if !net.is_zero() {
                    top_factors.push((base, rational_expr(&net)));
                }
            }
            _ => top_factors.push((base, sum(vec![exponent, lower.negate()]))),
        }
    }

    if !outcome.coefficient && !outcome.bases {
        return (div(numerator, denominator), outcome);
    }
    let top = assemble(top_coefficient, top_factors);
    if bottom_factors.is_empty() && bottom_coefficient.is_one() {
        return (top, outcome);
    }
    (div(top, assemble(bottom_coefficient, bottom_factors)), outcome)
}

struct Factors {
    coefficient: Numeral,
    powers: Vec<(Expr, Expr)>,
}

fn split_factors(expr: &Expr) -> Factors {
    let mut coefficient = Numeral::one();
    let mut powers = Vec::new();
    for factor in factors_of(expr.clone()) {
        match factor {
            Expr::Number(n) => coefficient = coefficient.mul(&n),
            other => powers.push(split_power(other)),
        }
    }
    Factors {
        coefficient,
        powers,
    }
}

fn assemble(coefficient: Numeral, powers: Vec<(Expr, Expr)>) -> Expr {
    let mut factors = Vec::with_capacity(powers.len() + 1);
    if !coefficient.is_one() {
        factors.push(Expr::Number(coefficient));
    }
    for (base, exponent) in powers {
        if exponent.is_one() {
            factors.push(base);
        } else {
            factors.push(pow(base, exponent));
        }
    }
    product(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn cancelled(input: &str) -> String {
        cancel(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn reduces_numeral_quotients() {
        assert_eq!(cancelled("4 / 8"), "1 / 2");
        assert_eq!(cancelled("3 / -7"), "-3 / 7");
    }

    #[test]
    fn nets_exponents_of_shared_bases() {
        assert_eq!(cancelled("x / x^2"), "1 / x");
        assert_eq!(cancelled("(6 * x^3) / (4 * x)"), "(3x^2) / 2");
        assert_eq!(cancelled("x^a / x^b"), "x^(a + -b)");
    }

    #[test]
    fn flattens_nested_quotients() {
        assert_eq!(cancelled("(a / b) / c"), "a / (b * c)");
        assert_eq!(cancelled("a / (b / c)"), "(a * c) / b");
    }

    #[test]
    fn complex_quotients_fold() {
        assert_eq!(cancelled("2i / 4"), "0.5i");
    }

    #[test]
    fn unrelated_factors_are_untouched() {
        let (_, changed) = cancel(parse_expr("x / y").expect("parse input"));
        assert!(!changed);
    }
}
