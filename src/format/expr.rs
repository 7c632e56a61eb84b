use crate::expr::{Call, Expr, Node, Operator};
use crate::numeral::Numeral;

const BIT_OR: u8 = 1;
const BIT_XOR: u8 = 2;
const BIT_AND: u8 = 3;
const SHIFT: u8 = 4;
pub(crate) const SUM: u8 = 5;
const PRODUCT: u8 = 6;
pub(crate) const UNARY: u8 = 7;
const POWER: u8 = 8;
pub(crate) const ATOM: u8 = 9;

/// Canonical single-line rendering, used for display and for equality assertions.
pub fn render(expr: &Expr) -> String {
    match expr {
        Expr::Number(n) => n.to_string(),
        Expr::Complex(c) => c.to_string(),
        Expr::Identifier(name) => name.clone(),
        Expr::Call(call) => render_call(call),
        Expr::Node(node) => render_node(node),
    }
}

/// Binding strength of the outermost construct of `expr`; higher binds tighter.
pub(crate) fn level(expr: &Expr) -> u8 {
    match expr {
        Expr::Number(n) if n.is_negative() => UNARY,
        Expr::Number(_) | Expr::Identifier(_) | Expr::Call(_) => ATOM,
        Expr::Complex(c) if !c.re.is_zero() => SUM,
        Expr::Complex(c) if c.im.is_negative() => UNARY,
        Expr::Complex(_) => ATOM,
        Expr::Node(node) if node.operator == Operator::Multiply && is_negation(&node.operands) => {
            UNARY
        }
        Expr::Node(node) => operator_level(node.operator),
    }
}

pub(crate) fn operator_level(operator: Operator) -> u8 {
    match operator {
        Operator::Add | Operator::Subtract => SUM,
        Operator::Multiply | Operator::Divide | Operator::Modulus => PRODUCT,
        Operator::Raise => POWER,
        Operator::BitOr => BIT_OR,
        Operator::BitXor => BIT_XOR,
        Operator::BitAnd => BIT_AND,
        Operator::LeftShift | Operator::RightShift => SHIFT,
    }
}

pub(crate) fn is_negation(operands: &[Expr]) -> bool {
    matches!(operands, [Expr::Number(n), _] if n == &Numeral::integer(-1))
}

/// A numeral written directly against an identifier or a power of one: `2x`, `-x`, `5e^x`.
pub(crate) fn juxtaposed(operands: &[Expr]) -> Option<(&Numeral, &Expr)> {
    match operands {
        [Expr::Number(n), rest] if !n.is_nan() => {
            let base = match rest {
                Expr::Node(Node {
                    operator: Operator::Raise,
                    operands,
                }) => operands.first()?,
                other => other,
            };
            matches!(base, Expr::Identifier(_)).then_some((n, rest))
        }
        _ => None,
    }
}

pub(crate) fn coefficient_text(n: &Numeral) -> String {
    if n == &Numeral::integer(-1) {
        "-".to_string()
    } else {
        n.to_string()
    }
}

fn wrap(expr: &Expr, parens: bool) -> String {
    if parens {
        format!("({})", render(expr))
    } else {
        render(expr)
    }
}

fn render_call(call: &Call) -> String {
    let args: Vec<String> = call.args.iter().map(render).collect();
    format!("{}({})", call.function.name(), args.join(", "))
}

fn render_node(node: &Node) -> String {
    let ops = &node.operands;
    match node.operator {
        Operator::Add => ops
            .iter()
            .enumerate()
            .map(|(i, op)| {
                wrap(
                    op,
                    level(op) < SUM
                        || op.is_op(Operator::Add)
                        || (i > 0 && op.is_op(Operator::Subtract)),
                )
            })
            .collect::<Vec<_>>()
            .join(" + "),
        Operator::Multiply => {
            if let Some((coef, rest)) = juxtaposed(ops) {
                return format!("{}{}", coefficient_text(coef), render(rest));
            }
            if is_negation(ops) {
                return format!("-{}", wrap(&ops[1], level(&ops[1]) < UNARY));
            }
            ops.iter()
                .map(|op| wrap(op, level(op) < UNARY))
                .collect::<Vec<_>>()
                .join(" * ")
        }
        Operator::Subtract => binary(ops, " - ", |l| level(l) < SUM, |r| level(r) <= SUM),
        Operator::Divide | Operator::Modulus => {
            let sep = if node.operator == Operator::Divide { " / " } else { " % " };
            binary(ops, sep, |l| level(l) < UNARY, |r| level(r) < UNARY)
        }
        Operator::Raise => binary(ops, "^", |l| level(l) < ATOM, |r| level(r) < ATOM),
        Operator::LeftShift | Operator::RightShift => binary(
            ops,
            if node.operator == Operator::LeftShift { " << " } else { " >> " },
            |l| level(l) < SHIFT,
            |r| level(r) <= SHIFT,
        ),
        Operator::BitAnd | Operator::BitOr | Operator::BitXor => {
            let own = operator_level(node.operator);
            let sep = format!(" {} ", node.operator.symbol());
            ops.iter()
                .map(|op| wrap(op, level(op) < own || op.is_op(node.operator)))
                .collect::<Vec<_>>()
                .join(&sep)
        }
    }
}

fn binary(
    ops: &[Expr],
    sep: &str,
    left_parens: impl Fn(&Expr) -> bool,
    right_parens: impl Fn(&Expr) -> bool,
) -> String {
    match ops {
        [left, right] => format!(
            "{}{sep}{}",
            wrap(left, left_parens(left)),
            wrap(right, right_parens(right))
        ),
        _ => ops.iter().map(render).collect::<Vec<_>>().join(sep),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, div, mul, pow, product, sub};

    fn x() -> Expr {
        Expr::ident("x")
    }

    #[test]
    fn juxtaposes_numeral_coefficients() {
        assert_eq!(render(&mul(Expr::number(2), x())), "2x");
        assert_eq!(render(&mul(Expr::number(-1), x())), "-x");
        assert_eq!(
            render(&mul(Expr::number(5), pow(Expr::ident("e"), x()))),
            "5e^x"
        );
        assert_eq!(
            render(&product(vec![Expr::number(2), x(), Expr::ident("y")])),
            "2 * x * y"
        );
    }

    #[test]
    fn parenthesizes_by_binding_strength() {
        let sum = add(x(), Expr::number(1));
        assert_eq!(render(&mul(Expr::number(2), sum.clone())), "2 * (x + 1)");
        assert_eq!(render(&sub(x(), sum.clone())), "x - (x + 1)");
        assert_eq!(render(&div(Expr::number(1), sum)), "1 / (x + 1)");
        assert_eq!(render(&pow(x(), Expr::number(-3))), "x^(-3)");
        assert_eq!(
            render(&div(mul(Expr::number(3), x()), Expr::ident("y"))),
            "(3x) / y"
        );
    }
}
