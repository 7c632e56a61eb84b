use tracing::debug;

use super::{bottom_up, shrink};
use crate::expr::{div, ln, one, product, zero, Call, Expr, Function, Node, Operator};
use crate::numeral::Numeral;

/// Evaluates calls at their special points and moves signs out of symmetric functions.
pub fn simplify_method_call(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Call(call) => rewrite_call(call),
        other => (other, false),
    })
}

/// The call stage of `shrink`: call rewrites plus reciprocal functions pulled out of
/// denominators, so `x / sin(x)` becomes `x * csc(x)`.
pub(crate) fn simplify_calls(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e {
        Expr::Call(call) => rewrite_call(call),
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => reciprocal_out_of_denominator(operands),
        other => (other, false),
    })
}

/// Rewrites logarithms to natural logarithms and shrinks, giving the trigonometric
/// and hyperbolic identities a chance to fire on the result.
pub fn simplify_trigonometry(expr: Expr) -> (Expr, bool) {
    let original = expr.clone();
    let (rewritten, _) = bottom_up(expr, &mut |e| match e {
        Expr::Call(Call {
            function: Function::Log,
            args,
        }) => log_to_ln(args),
        other => (other, false),
    });
    let (result, _) = shrink(rewritten);
    let changed = result != original;
    debug!(target: "shrink", changed, "trigonometric simplification");
    (result, changed)
}

fn log_to_ln(mut args: Vec<Expr>) -> (Expr, bool) {
    match args.len() {
        1 => (div(ln(args.remove(0)), ln(Expr::number(10))), true),
        2 => {
            let argument = args.remove(1);
            let base = args.remove(0);
            (div(ln(argument), ln(base)), true)
        }
        _ => (Expr::call(Function::Log, args), false),
    }
}

fn rewrite_call(call: Call) -> (Expr, bool) {
    let Call { function, mut args } = call;
    if function == Function::Log && args.len() == 2 {
        if args[0] == args[1] {
            return (one(), true);
        }
        if args[1].is_one() {
            return (zero(), true);
        }
        return (Expr::call(function, args), false);
    }
    if args.len() != 1 {
        return (Expr::call(function, args), false);
    }
    let arg = args.remove(0);
    if arg.is_negative() && function.is_odd() {
        let (inner, _) = rewrite_unary(function, arg.abs_term());
        return (inner.negate(), true);
    }
    if arg.is_negative() && function.is_even() {
        let (inner, _) = rewrite_unary(function, arg.abs_term());
        return (inner, true);
    }
    rewrite_unary(function, arg)
}

fn rewrite_unary(function: Function, arg: Expr) -> (Expr, bool) {
    match special_value(&function, &arg) {
        Some(value) => (value, true),
        None => (Expr::unary(function, arg), false),
    }
}

fn special_value(function: &Function, arg: &Expr) -> Option<Expr> {
    use Function::*;
    if arg.is_zero() {
        return match function {
            Sin | Tan | Sinh | Tanh | Asin | Atan | Asinh | Atanh | Abs | Sqrt | Sgn => {
                Some(zero())
            }
            Cos | Sec | Cosh | Sech => Some(one()),
            _ => None,
        };
    }
    match (function, arg) {
        (Ln | Log, _) if arg.is_one() => Some(zero()),
        (Ln, Expr::Identifier(name)) if name == "e" => Some(one()),
        (Ln, Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        })) if operands.len() == 2 && operands[0].is_identifier("e") => Some(operands[1].clone()),
        (Abs, Expr::Number(n)) if !n.is_nan() => Some(Expr::Number(n.abs())),
        (Sqrt, Expr::Number(n)) => n.sqrt_exact().map(Expr::Number),
        (Sgn, Expr::Number(n)) if n.is_exact() => Some(Expr::integer(if n.is_negative() {
            -1
        } else {
            1
        })),
        (Sgn, Expr::Number(Numeral::Float(v))) => Some(Expr::number(if *v < 0.0 { -1 } else { 1 })),
        _ => None,
    }
}

fn reciprocal_out_of_denominator(operands: Vec<Expr>) -> (Expr, bool) {
    let [numerator, denominator] = match <[Expr; 2]>::try_from(operands) {
        Ok(pair) => pair,
        Err(operands) => return (Expr::node(Operator::Divide, operands), false),
    };
    let mut factors = match denominator {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => operands,
        other => vec![other],
    };
    let position = factors.iter().position(|f| {
        f.as_call()
            .is_some_and(|c| c.args.len() == 1 && c.function.reciprocal().is_some())
    });
    let Some(position) = position else {
        return (div(numerator, product(factors)), false);
    };
    let Expr::Call(Call { function, args }) = factors.remove(position) else {
        return (div(numerator, product(factors)), false);
    };
    let Some(flipped) = function.reciprocal() else {
        return (div(numerator, product(factors)), false);
    };
    let moved = Expr::call(flipped, args);
    let mut top = match numerator {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => operands,
        n if n.is_one() => Vec::new(),
        n => vec![n],
    };
    top.push(moved);
    let top = product(top);
    if factors.is_empty() {
        (top, true)
    } else {
        (div(top, product(factors)), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn calls(input: &str) -> String {
        simplify_calls(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn signs_leave_symmetric_functions() {
        assert_eq!(calls("sin(-x)"), "-sin(x)");
        assert_eq!(calls("cos(-x)"), "cos(x)");
        assert_eq!(calls("acos(-x)"), "acos(-x)");
    }

    #[test]
    fn special_points() {
        assert_eq!(calls("sin(0)"), "0");
        assert_eq!(calls("cos(0)"), "1");
        assert_eq!(calls("ln(e)"), "1");
        assert_eq!(calls("ln(1)"), "0");
        assert_eq!(calls("sqrt(9)"), "3");
        assert_eq!(calls("abs(-4)"), "4");
    }

    #[test]
    fn reciprocal_leaves_the_denominator() {
        assert_eq!(calls("x / sin(x)"), "x * csc(x)");
        assert_eq!(calls("1 / cos(x)"), "sec(x)");
    }

    #[test]
    fn logarithms_become_natural() {
        let (result, changed) =
            simplify_trigonometry(parse_expr("log(2, 8)").expect("parse input"));
        assert!(changed);
        assert_eq!(result.to_string(), "ln(8) / ln(2)");
    }
}
