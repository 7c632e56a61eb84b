use tracing::debug;

use crate::error::{CasError, Result};
use crate::expr::{
    div, ln, one, pow, product, rational_expr, sub, sum, zero, Call, Expr, Function, Node,
    Operator,
};
use crate::numeral::Numeral;
use crate::simplify::shrunk;

/// Derivative of `expr` with respect to `symbol`, shrunk.
///
/// Calls to functions without a derivative rule, and bitwise or modulus operators whose
/// operands depend on `symbol`, are reported as errors.
pub fn derive(expr: &Expr, symbol: &str) -> Result<Expr> {
    let raw = Differentiator { var: symbol }.derive(expr)?;
    let result = shrunk(raw);
    debug!(target: "derive", %expr, symbol, %result, "derivative");
    Ok(result)
}

struct Differentiator<'a> {
    var: &'a str,
}

impl<'a> Differentiator<'a> {
    fn derive(&self, expr: &Expr) -> Result<Expr> {
        if !expr.find_identifier(self.var) {
            return Ok(zero());
        }
        match expr {
            Expr::Identifier(_) => Ok(one()),
            Expr::Call(call) => self.call_rule(call),
            Expr::Node(Node { operator, operands }) => match (operator, operands.as_slice()) {
                (Operator::Add, terms) => Ok(sum(terms
                    .iter()
                    .map(|t| self.derive(t))
                    .collect::<Result<Vec<_>>>()?)),
                (Operator::Subtract, [a, b]) => Ok(sub(self.derive(a)?, self.derive(b)?)),
                (Operator::Multiply, factors) => self.product_rule(factors),
                (Operator::Divide, [a, b]) => self.quotient_rule(a, b),
                (Operator::Raise, [base, exponent]) => self.power_rule(base, exponent),
                _ => Err(self.not_differentiable(expr)),
            },
            Expr::Number(_) | Expr::Complex(_) => Ok(zero()),
        }
    }

    fn not_differentiable(&self, expr: &Expr) -> CasError {
        CasError::NotDifferentiable {
            expr: expr.to_string(),
            symbol: self.var.to_string(),
        }
    }

    fn product_rule(&self, factors: &[Expr]) -> Result<Expr> {
        let Some((first, rest)) = factors.split_first() else {
            return Ok(zero());
        };
        let mut value = first.clone();
        let mut derivative = self.derive(first)?;
        for factor in rest {
            let next = self.derive(factor)?;
            derivative = sum(vec![
                product(vec![derivative, factor.clone()]),
                product(vec![value.clone(), next]),
            ]);
            value = product(vec![value, factor.clone()]);
        }
        Ok(derivative)
    }

    fn quotient_rule(&self, numerator: &Expr, denominator: &Expr) -> Result<Expr> {
        let top = self.derive(numerator)?;
        if !denominator.find_identifier(self.var) {
            return Ok(div(top, denominator.clone()));
        }
        let bottom = self.derive(denominator)?;
        Ok(div(
            sub(
                product(vec![top, denominator.clone()]),
                product(vec![numerator.clone(), bottom]),
            ),
            pow(denominator.clone(), Expr::number(2)),
        ))
    }

    fn power_rule(&self, base: &Expr, exponent: &Expr) -> Result<Expr> {
        let base_free = !base.find_identifier(self.var);
        let exponent_free = !exponent.find_identifier(self.var);
        let power = pow(base.clone(), exponent.clone());
        if exponent_free {
            let lowered = match exponent.as_number() {
                Some(n) => rational_expr(&n.sub(&Numeral::one())),
                None => sum(vec![exponent.clone(), Expr::number(-1)]),
            };
            return Ok(product(vec![
                exponent.clone(),
                pow(base.clone(), lowered),
                self.derive(base)?,
            ]));
        }
        let inner = self.derive(exponent)?;
        if base_free {
            if base.is_identifier("e") {
                return Ok(product(vec![power, inner]));
            }
            return Ok(product(vec![power, ln(base.clone()), inner]));
        }
        let outer = self.derive(base)?;
        Ok(product(vec![
            power,
            sum(vec![
                product(vec![inner, ln(base.clone())]),
                div(product(vec![exponent.clone(), outer]), base.clone()),
            ]),
        ]))
    }

    fn call_rule(&self, call: &Call) -> Result<Expr> {
        match (&call.function, call.args.as_slice()) {
            (Function::Log, [base, argument]) => {
                if base.find_identifier(self.var) {
                    return self.derive(&div(ln(argument.clone()), ln(base.clone())));
                }
                Ok(div(
                    self.derive(argument)?,
                    product(vec![argument.clone(), ln(base.clone())]),
                ))
            }
            (function, [argument]) => {
                let outer = self.outer_derivative(function, argument)?;
                Ok(product(vec![outer, self.derive(argument)?]))
            }
            _ => Err(CasError::UnknownFunction {
                function: call.function.name().to_string(),
            }),
        }
    }

    fn outer_derivative(&self, function: &Function, u: &Expr) -> Result<Expr> {
        use Function::*;
        let call = |f: Function| Expr::unary(f, u.clone());
        let squared = |e: Expr| pow(e, Expr::number(2));
        let u_squared = || squared(u.clone());
        let root = |e: Expr| Expr::unary(Sqrt, e);
        let reciprocal = |e: Expr| div(one(), e);
        let negative = |e: Expr| e.negate();
        Ok(match function {
            Sin => call(Cos),
            Cos => negative(call(Sin)),
            Tan => squared(call(Sec)),
            Csc => negative(product(vec![call(Csc), call(Cot)])),
            Sec => product(vec![call(Sec), call(Tan)]),
            Cot => negative(squared(call(Csc))),
            Asin => reciprocal(root(sub(one(), u_squared()))),
            Acos => negative(reciprocal(root(sub(one(), u_squared())))),
            Atan => reciprocal(sum(vec![one(), u_squared()])),
            Acot => negative(reciprocal(sum(vec![one(), u_squared()]))),
            Asec => reciprocal(product(vec![
                call(Abs),
                root(sub(u_squared(), one())),
            ])),
            Acsc => negative(reciprocal(product(vec![
                call(Abs),
                root(sub(u_squared(), one())),
            ]))),
            Sinh => call(Cosh),
            Cosh => call(Sinh),
            Tanh => squared(call(Sech)),
            Csch => negative(product(vec![call(Csch), call(Coth)])),
            Sech => negative(product(vec![call(Sech), call(Tanh)])),
            Coth => negative(squared(call(Csch))),
            Asinh => reciprocal(root(sum(vec![u_squared(), one()]))),
            Acosh => reciprocal(root(sub(u_squared(), one()))),
            Atanh | Acoth => reciprocal(sub(one(), u_squared())),
            Acsch => negative(reciprocal(product(vec![
                call(Abs),
                root(sum(vec![one(), u_squared()])),
            ]))),
            Asech => negative(reciprocal(product(vec![
                u.clone(),
                root(sub(one(), u_squared())),
            ]))),
            Ln => reciprocal(u.clone()),
            Log => reciprocal(product(vec![u.clone(), ln(Expr::number(10))])),
            Abs => call(Sgn),
            Sqrt => reciprocal(product(vec![Expr::number(2), call(Sqrt)])),
            Sgn => zero(),
            Other(name) => {
                return Err(CasError::UnknownFunction {
                    function: name.clone(),
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn derived(input: &str) -> String {
        let expr = parse_expr(input).expect("parse input");
        derive(&expr, "x").expect("derivative").to_string()
    }

    #[test]
    fn constants_vanish() {
        assert_eq!(derived("y^2 + 3"), "0");
        assert_eq!(derived("x"), "1");
    }

    #[test]
    fn power_rule() {
        assert_eq!(derived("x^3"), "3x^2");
    }

    #[test]
    fn chain_rule_through_calls() {
        assert_eq!(derived("sin(x)"), "cos(x)");
        assert_eq!(derived("ln(x)"), "1 / x");
    }

    #[test]
    fn opaque_calls_are_errors() {
        let expr = parse_expr("foo(x)").expect("parse input");
        assert!(matches!(
            derive(&expr, "x"),
            Err(CasError::UnknownFunction { .. })
        ));
        let expr = parse_expr("x % 3").expect("parse input");
        assert!(matches!(
            derive(&expr, "x"),
            Err(CasError::NotDifferentiable { .. })
        ));
    }
}
