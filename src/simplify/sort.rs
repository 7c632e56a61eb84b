use std::cmp::Ordering;

use super::bottom_up;
use crate::expr::{as_rational, compare, Expr, Node, Operator};
use crate::numeral::Numeral;

/// Orders the operands of commutative nodes.
///
/// Sums list monomials by descending total degree, then other symbolic terms, then numerals.
/// Products list numerals, complex numerals, identifiers, calls, symbolic powers and finally
/// compound factors; a power with a numeric exponent sorts with its base.
pub fn sort(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut sort_node)
}

fn sort_node(expr: Expr) -> (Expr, bool) {
    match expr {
        Expr::Node(Node { operator, operands }) => match operator {
            Operator::Add => reorder(operator, operands, compare_addends),
            Operator::Multiply => reorder(operator, operands, compare_factors),
            Operator::BitAnd | Operator::BitOr | Operator::BitXor => {
                reorder(operator, operands, compare)
            }
            _ => (Expr::node(operator, operands), false),
        },
        other => (other, false),
    }
}

fn reorder(
    operator: Operator,
    mut operands: Vec<Expr>,
    order: fn(&Expr, &Expr) -> Ordering,
) -> (Expr, bool) {
    let sorted = operands
        .windows(2)
        .all(|pair| order(&pair[0], &pair[1]) != Ordering::Greater);
    if !sorted {
        operands.sort_by(order);
    }
    (Expr::node(operator, operands), !sorted)
}

/// Total degree of a product of identifiers and identifier powers, ignoring numerals.
pub(crate) fn monomial_degree(term: &Expr) -> Option<i64> {
    match term {
        Expr::Identifier(_) => Some(1),
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) => match operands.as_slice() {
            [Expr::Identifier(_), Expr::Number(n)] => n.to_i64().filter(|d| *d > 0),
            _ => None,
        },
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let mut degree = 0;
            for factor in operands {
                if !matches!(factor, Expr::Number(_)) {
                    degree += monomial_degree(factor)?;
                }
            }
            (degree > 0).then_some(degree)
        }
        _ => None,
    }
}

fn is_numeral(term: &Expr) -> bool {
    matches!(term, Expr::Number(_) | Expr::Complex(_)) || as_rational(term).is_some()
}

fn addend_rank(term: &Expr) -> (u8, i64) {
    if is_numeral(term) {
        return (2, 0);
    }
    match monomial_degree(term) {
        Some(degree) => (0, -degree),
        None => (1, 0),
    }
}

fn without_coefficient(term: &Expr) -> &[Expr] {
    match term {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let start = operands
                .iter()
                .position(|f| !matches!(f, Expr::Number(_)))
                .unwrap_or(operands.len());
            &operands[start..]
        }
        other => std::slice::from_ref(other),
    }
}

fn compare_addends(a: &Expr, b: &Expr) -> Ordering {
    addend_rank(a)
        .cmp(&addend_rank(b))
        .then_with(|| without_coefficient(a).cmp(without_coefficient(b)))
        .then_with(|| compare(a, b))
}

fn factor_class(factor: &Expr) -> u8 {
    match factor {
        Expr::Number(_) => 0,
        Expr::Complex(_) => 1,
        Expr::Identifier(_) => 2,
        Expr::Call(_) => 3,
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) if operands.len() == 2 => {
            let numeric = as_rational(&operands[1]).is_some()
                || operands[1].as_number().is_some_and(|n: &Numeral| !n.is_nan());
            match (&operands[0], numeric) {
                (Expr::Node(_), true) => 5,
                (base, true) => factor_class(base),
                (_, false) => 4,
            }
        }
        Expr::Node(_) => 5,
    }
}

fn compare_factors(a: &Expr, b: &Expr) -> Ordering {
    factor_class(a)
        .cmp(&factor_class(b))
        .then_with(|| compare(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn sorted(input: &str) -> String {
        let expr = parse_expr(input).expect("parse input");
        sort(expr).0.to_string()
    }

    #[test]
    fn sums_put_higher_degrees_first_and_numerals_last() {
        assert_eq!(sorted("3 + x + x^2"), "x^2 + x + 3");
        assert_eq!(sorted("5 + sin(x) + y"), "y + sin(x) + 5");
    }

    #[test]
    fn products_put_numerals_first() {
        assert_eq!(sorted("x * 2"), "2x");
        assert_eq!(sorted("e^x * sin(x)"), "sin(x) * e^x");
    }

    #[test]
    fn sorted_input_reports_no_change() {
        let expr = parse_expr("x^2 + x + 1").expect("parse input");
        assert!(!sort(expr).1);
    }
}
