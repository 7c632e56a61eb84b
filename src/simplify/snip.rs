use super::bottom_up;
use crate::expr::{one, product, sum, zero, Expr, Node, Operator};

/// Removes identities and absorbing elements: `x + 0`, `x * 1`, `x * 0`, `x - x`, `x / 1`,
/// `x / x`, `x^1`, `x^0`, `1^x`, and the bitwise equivalents. A zero divisor yields `NaN / 1`.
pub fn snip(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut snip_node)
}

fn nan_over_one() -> Expr {
    Expr::node(Operator::Divide, vec![Expr::nan(), one()])
}

fn snip_node(expr: Expr) -> (Expr, bool) {
    let Expr::Node(Node { operator, operands }) = expr else {
        return (expr, false);
    };
    match operator {
        Operator::Add => drop_where(operands, Expr::is_zero, sum),
        Operator::Multiply => {
            let has_nan = operands.iter().any(Expr::is_nan);
            if !has_nan && operands.iter().any(Expr::is_zero) {
                return (zero(), true);
            }
            drop_where(operands, Expr::is_one, product)
        }
        Operator::BitOr => {
            let (operands, dropped) = dedup(operands);
            let (expr, zeros) = drop_where(operands, Expr::is_zero, sum_like(Operator::BitOr));
            (expr, dropped || zeros)
        }
        Operator::BitAnd => {
            if operands.iter().any(Expr::is_zero) {
                return (zero(), true);
            }
            let (operands, dropped) = dedup(operands);
            let changed = dropped || operands.len() == 1;
            (sum_like(Operator::BitAnd)(operands), changed)
        }
        Operator::BitXor => {
            let (operands, paired) = cancel_pairs(operands);
            let (expr, zeros) = drop_where(operands, Expr::is_zero, sum_like(Operator::BitXor));
            (expr, paired || zeros)
        }
        _ => match <[Expr; 2]>::try_from(operands) {
            Ok([left, right]) => snip_binary(operator, left, right),
            Err(operands) => (Expr::node(operator, operands), false),
        },
    }
}

fn snip_binary(operator: Operator, left: Expr, right: Expr) -> (Expr, bool) {
    match operator {
        Operator::Subtract if right.is_zero() => (left, true),
        Operator::Subtract if left == right && !left.is_nan() => (zero(), true),
        Operator::Divide if right.is_zero() => {
            let already = left.is_nan() && right.is_one();
            (nan_over_one(), !already)
        }
        Operator::Divide if left.is_nan() => (Expr::node(operator, vec![left, right]), false),
        Operator::Divide if right.is_one() => (left, true),
        Operator::Divide if left.is_zero() && !right.is_nan() => (zero(), true),
        Operator::Divide if left == right => (one(), true),
        Operator::Raise if right.is_one() => (left, true),
        Operator::Raise if right.is_zero() && !left.is_nan() => (one(), true),
        Operator::Raise if left.is_one() => (one(), true),
        Operator::LeftShift | Operator::RightShift if right.is_zero() => (left, true),
        Operator::LeftShift | Operator::RightShift if left.is_zero() => (zero(), true),
        _ => (Expr::node(operator, vec![left, right]), false),
    }
}

fn drop_where(
    operands: Vec<Expr>,
    unit: fn(&Expr) -> bool,
    rebuild: impl Fn(Vec<Expr>) -> Expr,
) -> (Expr, bool) {
    let before = operands.len();
    let kept: Vec<Expr> = operands.into_iter().filter(|op| !unit(op)).collect();
    let changed = kept.len() != before;
    (rebuild(kept), changed)
}

fn sum_like(operator: Operator) -> impl Fn(Vec<Expr>) -> Expr {
    move |mut operands| match operands.len() {
        0 => zero(),
        1 => operands.remove(0),
        _ => Expr::node(operator, operands),
    }
}

fn dedup(operands: Vec<Expr>) -> (Vec<Expr>, bool) {
    let before = operands.len();
    let mut kept: Vec<Expr> = Vec::with_capacity(before);
    for op in operands {
        if !kept.contains(&op) {
            kept.push(op);
        }
    }
    let changed = kept.len() != before;
    (kept, changed)
}

fn cancel_pairs(operands: Vec<Expr>) -> (Vec<Expr>, bool) {
    let mut kept: Vec<Expr> = Vec::with_capacity(operands.len());
    let mut changed = false;
    for op in operands {
        if let Some(i) = kept.iter().position(|k| k == &op) {
            kept.remove(i);
            changed = true;
        } else {
            kept.push(op);
        }
    }
    (kept, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn snipped(input: &str) -> String {
        snip(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn removes_identities() {
        assert_eq!(snipped("x + 0"), "x");
        assert_eq!(snipped("1 * y"), "y");
        assert_eq!(snipped("x^1"), "x");
        assert_eq!(snipped("x / 1"), "x");
        assert_eq!(snipped("x - 0"), "x");
    }

    #[test]
    fn absorbs_and_cancels() {
        assert_eq!(snipped("x * 0 * y"), "0");
        assert_eq!(snipped("x - x"), "0");
        assert_eq!(snipped("x / x"), "1");
        assert_eq!(snipped("0 / x"), "0");
        assert_eq!(snipped("1^x"), "1");
        assert_eq!(snipped("3^0"), "1");
    }

    #[test]
    fn zero_divisor_is_nan() {
        assert_eq!(snipped("x / 0"), "NaN / 1");
        let (_, changed) = snip(parse_expr("x / 0").map(|e| snip(e).0).expect("parse input"));
        assert!(!changed);
    }

    #[test]
    fn bitwise_identities() {
        assert_eq!(snipped("x | 0"), "x");
        assert_eq!(snipped("x & x"), "x");
        assert_eq!(snipped("x & 0"), "0");
        assert_eq!(snipped("x ^^ x"), "0");
        assert_eq!(snipped("x << 0"), "x");
    }
}
