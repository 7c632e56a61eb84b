use num_traits::ToPrimitive;

use super::cancel::factors_of;
use super::{bottom_up, merge};
use crate::expr::{div, one, pow, product, sum, Expr, Node, Operator};
use crate::numeral::Numeral;

const DISTRIBUTE_TERM_LIMIT: usize = 64;
const EXPAND_POWER_LIMIT: usize = 16;
const MADMAN_ROUNDS: usize = 64;

/// Product of two factors, splicing operands of either side that is already a product.
pub(crate) fn times(a: Expr, b: Expr) -> Expr {
    let mut factors = factors_of(a);
    factors.extend(factors_of(b));
    factors.retain(|f| !f.is_one());
    product(factors)
}

fn addends(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Node(Node {
            operator: Operator::Add,
            operands,
        }) => operands,
        other => vec![other],
    }
}

pub fn convert_subtract_to_add(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Subtract,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([left, right]) => {
                let mut terms = addends(left);
                terms.push(right.negate());
                (Expr::node(Operator::Add, terms), true)
            }
            Err(operands) => (Expr::node(Operator::Subtract, operands), false),
        },
        other => (other, false),
    })
}

/// Puts a non-negative addend first when a sum starts with a negative one.
pub fn order_subtract(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Add,
            operands,
        }) => {
            let (operands, moved) = lead_with_positive(operands);
            (Expr::node(Operator::Add, operands), moved)
        }
        other => (other, false),
    })
}

fn lead_with_positive(mut operands: Vec<Expr>) -> (Vec<Expr>, bool) {
    if !operands.first().is_some_and(Expr::is_negative) {
        return (operands, false);
    }
    match operands.iter().position(|op| !op.is_negative()) {
        Some(i) => {
            let positive = operands.remove(i);
            operands.insert(0, positive);
            (operands, true)
        }
        None => (operands, false),
    }
}

/// Undoes `convert_subtract_to_add`: every negative addend after the first becomes a binary
/// subtraction of its absolute value.
pub fn convert_add_to_subtract(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Add,
            operands,
        }) if operands.len() > 1 => {
            let (operands, moved) = lead_with_positive(operands);
            if !operands[1..].iter().any(Expr::is_negative) {
                return (Expr::node(Operator::Add, operands), moved);
            }
            let mut run: Vec<Expr> = Vec::new();
            for op in operands {
                if run.is_empty() || !op.is_negative() {
                    run.push(op);
                } else {
                    let left = sum(std::mem::take(&mut run));
                    run.push(Expr::node(Operator::Subtract, vec![left, op.abs_term()]));
                }
            }
            (sum(run), true)
        }
        other => (other, false),
    })
}

pub fn convert_divide_to_multiply(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([n, d]) => (times(n, pow(d, Expr::number(-1))), true),
            Err(operands) => (Expr::node(Operator::Divide, operands), false),
        },
        other => (other, false),
    })
}

fn negative_exponent(factor: &Expr) -> Option<Numeral> {
    let (_, exponent) = factor.binary(Operator::Raise)?;
    exponent.as_number().filter(|n| n.is_negative()).cloned()
}

fn flip_power(factor: Expr) -> Expr {
    match factor {
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([base, Expr::Number(n)]) if n == Numeral::integer(-1) => base,
            Ok([base, Expr::Number(n)]) => pow(base, Expr::Number(n.neg())),
            Ok([base, exponent]) => pow(base, exponent),
            Err(operands) => Expr::node(Operator::Raise, operands),
        },
        other => other,
    }
}

fn reciprocal_base(factor: &Expr) -> bool {
    negative_exponent(factor).is_some()
        || factor
            .binary(Operator::Divide)
            .is_some_and(|(n, _)| n.is_one())
}

fn below_the_bar(factor: Expr) -> Expr {
    match factor {
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([_, d]) => d,
            Err(operands) => Expr::node(Operator::Divide, operands),
        },
        other => flip_power(other),
    }
}

/// Inverse of `convert_divide_to_multiply`: factors with negative numeral exponents move
/// below a quotient bar.
pub fn convert_multiply_to_divide(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| {
        if negative_exponent(&e).is_some() {
            return (div(one(), flip_power(e)), true);
        }
        match e {
            Expr::Node(Node {
                operator: Operator::Multiply,
                operands,
            }) if operands.iter().any(reciprocal_base) => {
                let (bottom, top): (Vec<Expr>, Vec<Expr>) =
                    operands.into_iter().partition(reciprocal_base);
                let bottom = bottom.into_iter().map(below_the_bar).collect();
                (div(product(top), product(bottom)), true)
            }
            other => (other, false),
        }
    })
}

fn small_positive_exponent(exponent: &Expr) -> Option<usize> {
    exponent
        .as_number()
        .and_then(Numeral::to_integer)
        .and_then(|n| n.to_usize())
        .filter(|n| (2..=EXPAND_POWER_LIMIT).contains(n))
}

fn multiply_out(terms: &[Expr], power: usize) -> Expr {
    let mut expanded: Vec<Expr> = terms.to_vec();
    for _ in 1..power {
        expanded = expanded
            .iter()
            .flat_map(|t| terms.iter().map(move |o| times(t.clone(), o.clone())))
            .collect();
    }
    sum(expanded)
}

fn expand_node(expr: Expr, limit: usize) -> (Expr, bool) {
    let Some((base, exponent)) = expr.binary(Operator::Raise) else {
        return (expr, false);
    };
    let (Some(terms), Some(power)) = (
        base.operands_of(Operator::Add),
        small_positive_exponent(exponent),
    ) else {
        return (expr, false);
    };
    let fits = u32::try_from(power)
        .ok()
        .and_then(|p| terms.len().checked_pow(p))
        .is_some_and(|count| count <= limit);
    if !fits {
        return (expr, false);
    }
    (multiply_out(terms, power), true)
}

/// Multiplies out small positive integer powers of sums: `(x + 1)^2` becomes
/// `x * x + x + x + 1`, left for `combine` to collect.
pub fn expand(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| expand_node(e, DISTRIBUTE_TERM_LIMIT))
}

pub fn expand_raise(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| {
        let split = e
            .binary(Operator::Raise)
            .and_then(|(base, exponent)| Some((base, exponent.operands_of(Operator::Add)?)));
        match split {
            Some((base, terms)) => {
                let factors = terms.iter().map(|t| pow(base.clone(), t.clone())).collect();
                (product(factors), true)
            }
            None => (e, false),
        }
    })
}

pub fn expand_divide(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| {
        let split = e
            .binary(Operator::Divide)
            .and_then(|(n, d)| Some((n.operands_of(Operator::Add)?, d)));
        match split {
            Some((terms, d)) => {
                let quotients = terms.iter().map(|t| div(t.clone(), d.clone())).collect();
                (sum(quotients), true)
            }
            None => (e, false),
        }
    })
}

fn distribute_over(operands: Vec<Expr>, position: usize) -> Expr {
    let mut operands = operands;
    let terms = addends(operands.remove(position));
    let distributed = terms
        .into_iter()
        .map(|term| {
            let mut factors = operands.clone();
            factors.insert(position, term);
            factors
                .into_iter()
                .reduce(times)
                .unwrap_or_else(one)
        })
        .collect();
    sum(distributed)
}

fn distributed_size(operands: &[Expr], position: usize) -> usize {
    operands[position].children().len()
}

/// Multiplies a product over its first sum operand: `2 * (x + y)` becomes `2 * x + 2 * y`.
pub fn distribute(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => match operands.iter().position(|op| op.is_op(Operator::Add)) {
            Some(i) if distributed_size(&operands, i) <= DISTRIBUTE_TERM_LIMIT => {
                (distribute_over(operands, i), true)
            }
            _ => (Expr::node(Operator::Multiply, operands), false),
        },
        other => (other, false),
    })
}

/// The distribution `shrink` runs: only products holding exactly one sum are multiplied out,
/// which keeps factored products of several sums intact.
pub(crate) fn distribute_single(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let sums: Vec<usize> = operands
                .iter()
                .enumerate()
                .filter(|(_, op)| op.is_op(Operator::Add))
                .map(|(i, _)| i)
                .collect();
            match sums.as_slice() {
                [i] if distributed_size(&operands, *i) <= DISTRIBUTE_TERM_LIMIT => {
                    (distribute_over(operands, *i), true)
                }
                _ => (Expr::node(Operator::Multiply, operands), false),
            }
        }
        other => (other, false),
    })
}

/// Expands every power of a sum and distributes every product until nothing changes.
pub fn distribute_like_a_madman(expr: Expr) -> (Expr, bool) {
    let mut current = expr;
    let mut changed = false;
    for _ in 0..MADMAN_ROUNDS {
        let (next, expanded) = bottom_up(current, &mut |e| expand_node(e, usize::MAX));
        let (next, distributed) = distribute(next);
        let (next, merged) = merge(next);
        current = next;
        if !(expanded || distributed || merged) {
            break;
        }
        changed = true;
    }
    (current, changed)
}

/// `x^n * y^n` becomes `(x * y)^n` and `x^n / y^n` becomes `(x / y)^n`.
pub fn collect_powers(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => collect_product_powers(operands),
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([n, d]) => match (n.binary(Operator::Raise), d.binary(Operator::Raise)) {
                (Some((a, e1)), Some((b, e2))) if e1 == e2 => {
                    (pow(div(a.clone(), b.clone()), e1.clone()), true)
                }
                _ => (div(n, d), false),
            },
            Err(operands) => (Expr::node(Operator::Divide, operands), false),
        },
        other => (other, false),
    })
}

fn collect_product_powers(operands: Vec<Expr>) -> (Expr, bool) {
    let mut out: Vec<Expr> = Vec::with_capacity(operands.len());
    let mut groups: Vec<(Expr, Vec<Expr>)> = Vec::new();
    for factor in operands {
        match factor.binary(Operator::Raise) {
            Some((base, exponent)) => {
                let (base, exponent) = (base.clone(), exponent.clone());
                match groups.iter_mut().find(|(e, _)| e == &exponent) {
                    Some((_, bases)) => bases.push(base),
                    None => groups.push((exponent, vec![base])),
                }
            }
            None => out.push(factor),
        }
    }
    let mut changed = false;
    for (exponent, bases) in groups {
        if bases.len() > 1 {
            changed = true;
            out.push(pow(product(bases), exponent));
        } else {
            out.extend(bases.into_iter().map(|b| pow(b, exponent.clone())));
        }
    }
    (product(out), changed)
}

/// Writes a sum with quotients over the denominator of its first quotient.
pub fn multiply_by_denominator(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Add,
            operands,
        }) => {
            let denominator = operands
                .iter()
                .find_map(|op| op.binary(Operator::Divide).map(|(_, d)| d.clone()));
            let Some(denominator) = denominator else {
                return (Expr::node(Operator::Add, operands), false);
            };
            let terms = operands
                .into_iter()
                .map(|op| match op.binary(Operator::Divide) {
                    Some((n, d)) if d == &denominator => n.clone(),
                    _ => times(op, denominator.clone()),
                })
                .collect();
            (div(sum(terms), denominator), true)
        }
        other => (other, false),
    })
}

pub fn move_number_to_front(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let first_symbolic = operands.iter().position(|f| !matches!(f, Expr::Number(_)));
            let misplaced = first_symbolic.is_some_and(|i| {
                operands[i..].iter().any(|f| matches!(f, Expr::Number(_)))
            });
            if !misplaced {
                return (Expr::node(Operator::Multiply, operands), false);
            }
            let (mut numbers, rest): (Vec<Expr>, Vec<Expr>) = operands
                .into_iter()
                .partition(|f| matches!(f, Expr::Number(_)));
            numbers.extend(rest);
            (Expr::node(Operator::Multiply, numbers), true)
        }
        other => (other, false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn run(pass: fn(Expr) -> (Expr, bool), input: &str) -> String {
        pass(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn subtraction_round_trip() {
        let input = parse_expr("a - b - c").expect("parse input");
        let (added, changed) = convert_subtract_to_add(input.clone());
        assert!(changed);
        assert_eq!(added.to_string(), "a + -b + -c");
        assert_eq!(convert_add_to_subtract(added).0, input);
    }

    #[test]
    fn leading_negative_term_moves_back() {
        assert_eq!(run(convert_add_to_subtract, "-a + b"), "b - a");
        assert_eq!(run(order_subtract, "-a + b"), "b + -a");
    }

    #[test]
    fn distributes_over_sums() {
        assert_eq!(run(distribute, "2 * (x + y)"), "2x + 2y");
        assert_eq!(run(expand_divide, "(a + b) / c"), "a / c + b / c");
        assert_eq!(run(expand_raise, "a^(b + c)"), "a^b * a^c");
    }

    #[test]
    fn expands_powers_of_sums() {
        assert_eq!(run(expand, "(x + 1)^2"), "x * x + x + x + 1");
    }

    #[test]
    fn quotient_and_power_conversions() {
        assert_eq!(run(convert_divide_to_multiply, "a / b"), "a * b^(-1)");
        assert_eq!(run(convert_multiply_to_divide, "a * b^(-1)"), "a / b");
        assert_eq!(run(collect_powers, "x^2 * y^2"), "(x * y)^2");
        assert_eq!(run(multiply_by_denominator, "a / c + b"), "(a + b * c) / c");
        assert_eq!(run(move_number_to_front, "x * 3"), "3x");
    }
}
