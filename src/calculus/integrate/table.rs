use crate::expr::{
    div, ln, one, pow, product, rational_expr, sub, sum, Call, Expr, Function, Operator,
};
use crate::numeral::Numeral;
use crate::simplify::shrunk;

fn ln_abs(arg: Expr) -> Expr {
    ln(Expr::unary(Function::Abs, arg))
}

fn half(e: Expr) -> Expr {
    div(e, Expr::number(2))
}

/// Closed-form antiderivatives of the elementary forms in the bare symbol.
pub(crate) fn lookup(expr: &Expr, var: &str) -> Option<Expr> {
    let x = Expr::ident(var);
    match expr {
        Expr::Identifier(name) if name == var => Some(half(pow(x, Expr::number(2)))),
        Expr::Call(call) => call_antiderivative(call, &x),
        Expr::Node(node) => match (node.operator, node.operands.as_slice()) {
            (Operator::Raise, [base, exponent]) => power_antiderivative(base, exponent, &x),
            (Operator::Divide, [numerator, denominator])
                if !numerator.find_identifier(var) =>
            {
                let reciprocal = reciprocal_antiderivative(denominator, &x)?;
                Some(if numerator.is_one() {
                    reciprocal
                } else {
                    product(vec![numerator.clone(), reciprocal])
                })
            }
            (Operator::Multiply, [a, b]) => pair_antiderivative(a, b, &x)
                .or_else(|| pair_antiderivative(b, a, &x)),
            _ => None,
        },
        _ => None,
    }
}

fn power_antiderivative(base: &Expr, exponent: &Expr, x: &Expr) -> Option<Expr> {
    let var = x.as_identifier()?;
    if base == x && !exponent.find_identifier(var) {
        return Some(power_rule(x, exponent));
    }
    if exponent == x && !base.find_identifier(var) {
        let power = pow(base.clone(), exponent.clone());
        return Some(if base.is_identifier("e") {
            power
        } else {
            div(power, ln(base.clone()))
        });
    }
    if exponent == &Expr::number(2) {
        let call = base.as_call()?;
        if call.args.as_slice() != [x.clone()] {
            return None;
        }
        return Some(match call.function {
            Function::Sec => Expr::unary(Function::Tan, x.clone()),
            Function::Csc => Expr::unary(Function::Cot, x.clone()).negate(),
            Function::Sech => Expr::unary(Function::Tanh, x.clone()),
            Function::Csch => Expr::unary(Function::Coth, x.clone()).negate(),
            _ => return None,
        });
    }
    None
}

fn power_rule(x: &Expr, exponent: &Expr) -> Expr {
    if exponent == &Expr::number(-1) {
        return ln_abs(x.clone());
    }
    let raised = shrunk(sum(vec![exponent.clone(), one()]));
    div(pow(x.clone(), raised.clone()), raised)
}

fn reciprocal_antiderivative(denominator: &Expr, x: &Expr) -> Option<Expr> {
    if denominator == x {
        return Some(ln_abs(x.clone()));
    }
    if let Some((base, exponent)) = denominator.binary(Operator::Raise) {
        if base == x {
            if let Some(n) = exponent.as_number() {
                return Some(power_rule(x, &Expr::Number(n.neg())));
            }
        }
    }
    let squared = || pow(x.clone(), Expr::number(2));
    if denominator == &shrunk(sum(vec![squared(), one()])) {
        return Some(Expr::unary(Function::Atan, x.clone()));
    }
    if denominator == &shrunk(sub(one(), squared())) {
        return Some(Expr::unary(Function::Atanh, x.clone()));
    }
    let radicand = denominator.as_unary(&Function::Sqrt)?;
    if radicand == &shrunk(sub(one(), squared())) {
        Some(Expr::unary(Function::Asin, x.clone()))
    } else if radicand == &shrunk(sum(vec![squared(), one()])) {
        Some(Expr::unary(Function::Asinh, x.clone()))
    } else if radicand == &shrunk(sub(squared(), one())) {
        Some(Expr::unary(Function::Acosh, x.clone()))
    } else {
        None
    }
}

fn call_antiderivative(call: &Call, x: &Expr) -> Option<Expr> {
    use Function::*;
    if call.args.as_slice() != [x.clone()] {
        return None;
    }
    let f = |function: Function| Expr::unary(function, x.clone());
    let times_x = |e: Expr| product(vec![x.clone(), e]);
    let squared = || pow(x.clone(), Expr::number(2));
    Some(match &call.function {
        Sin => f(Cos).negate(),
        Cos => f(Sin),
        Tan => ln_abs(f(Cos)).negate(),
        Cot => ln_abs(f(Sin)),
        Sec => ln_abs(sum(vec![f(Sec), f(Tan)])),
        Csc => ln_abs(sum(vec![f(Csc), f(Cot)])).negate(),
        Sinh => f(Cosh),
        Cosh => f(Sinh),
        Tanh => ln(f(Cosh)),
        Coth => ln_abs(f(Sinh)),
        Sech => Expr::unary(Atan, f(Sinh)),
        Csch => ln_abs(Expr::unary(Tanh, half(x.clone()))),
        Ln => sub(times_x(f(Ln)), x.clone()),
        Log => div(sub(times_x(ln(x.clone())), x.clone()), ln(Expr::number(10))),
        Asin => sum(vec![
            times_x(f(Asin)),
            Expr::unary(Sqrt, sub(one(), squared())),
        ]),
        Acos => sub(times_x(f(Acos)), Expr::unary(Sqrt, sub(one(), squared()))),
        Atan => sub(
            times_x(f(Atan)),
            half(ln(sum(vec![one(), squared()]))),
        ),
        Asinh => sub(
            times_x(f(Asinh)),
            Expr::unary(Sqrt, sum(vec![squared(), one()])),
        ),
        Acosh => sub(
            times_x(f(Acosh)),
            Expr::unary(Sqrt, sub(squared(), one())),
        ),
        Atanh => sum(vec![
            times_x(f(Atanh)),
            half(ln(sub(one(), squared()))),
        ]),
        Sqrt => product(vec![
            rational_expr(&Numeral::rational(2, 3)),
            pow(x.clone(), rational_expr(&Numeral::rational(3, 2))),
        ]),
        Abs => half(times_x(f(Abs))),
        Sgn => f(Abs),
        _ => return None,
    })
}

fn pair_antiderivative(a: &Expr, b: &Expr, x: &Expr) -> Option<Expr> {
    let (first, second) = (a.as_call()?, b.as_call()?);
    if first.args.as_slice() != [x.clone()] || second.args.as_slice() != [x.clone()] {
        return None;
    }
    let f = |function: Function| Expr::unary(function, x.clone());
    use Function::*;
    Some(match (&first.function, &second.function) {
        (Sec, Tan) => f(Sec),
        (Csc, Cot) => f(Csc).negate(),
        (Sech, Tanh) => f(Sech).negate(),
        (Csch, Coth) => f(Csch).negate(),
        (Sin, Cos) => half(pow(f(Sin), Expr::number(2))),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn table(input: &str) -> Option<String> {
        let expr = parse_expr(input).expect("parse input");
        lookup(&expr, "x").map(|e| shrunk(e).to_string())
    }

    #[test]
    fn reciprocal_is_a_logarithm() {
        assert_eq!(table("1 / x").as_deref(), Some("ln(abs(x))"));
        assert_eq!(table("x^(-1)").as_deref(), Some("ln(abs(x))"));
    }

    #[test]
    fn exponentials_and_circular_functions() {
        assert_eq!(table("e^x").as_deref(), Some("e^x"));
        assert_eq!(table("cos(x)").as_deref(), Some("sin(x)"));
        assert_eq!(table("sec(x)^2").as_deref(), Some("tan(x)"));
    }

    #[test]
    fn composite_arguments_are_not_in_the_table() {
        assert_eq!(table("sin(2x)"), None);
    }
}
