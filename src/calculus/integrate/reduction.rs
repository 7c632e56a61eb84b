use tracing::trace;

use super::Integrator;
use crate::expr::{div, one, pow, product, rational_expr, sub, sum, Expr, Function, Operator};
use crate::numeral::Numeral;
use crate::polynomial::degree;
use crate::simplify::{shrunk, split_coefficient, times};

const MAX_REDUCED_POWER: i64 = 12;

fn power_of(base: Expr, n: i64) -> Expr {
    match n {
        0 => one(),
        1 => base,
        _ => pow(base, Expr::number(n)),
    }
}

fn ratio(numerator: i64, denominator: i64) -> Expr {
    rational_expr(&Numeral::rational(numerator, denominator))
}

fn reducible_power(expr: &Expr, var: &str) -> Option<(Function, i64)> {
    let (base, exponent) = expr.binary(Operator::Raise)?;
    let n = exponent
        .as_number()?
        .to_i64()
        .filter(|n| (2..=MAX_REDUCED_POWER).contains(n))?;
    let call = base.as_call()?;
    match call.args.as_slice() {
        [arg] if arg.is_identifier(var) => Some((call.function.clone(), n)),
        _ => None,
    }
}

fn linear_call<'e>(expr: &'e Expr, var: &str) -> Option<(Function, &'e Expr)> {
    let call = expr.as_call()?;
    match (&call.function, call.args.as_slice()) {
        (Function::Sin | Function::Cos, [arg]) if degree(arg, &[var]) == Some(1) => {
            Some((call.function.clone(), arg))
        }
        _ => None,
    }
}

fn positive(d: Expr) -> (Expr, bool) {
    let (coefficient, _) = split_coefficient(d.clone());
    if coefficient.is_negative() {
        (shrunk(d.negate()), true)
    } else {
        (d, false)
    }
}

impl Integrator<'_> {
    /// Lowers the power of a circular or hyperbolic function by two per step:
    /// `∫ sin^n = -sin^(n-1) cos / n + (n-1)/n ∫ sin^(n-2)` and its relatives.
    pub(super) fn by_reduction(&self, expr: &Expr, depth: usize) -> Option<Expr> {
        use Function::*;
        let (function, n) = reducible_power(expr, self.var)?;
        let x = Expr::ident(self.var);
        let f = |function: Function| Expr::unary(function, x.clone());
        let raised = |function: Function, k: i64| power_of(f(function), k);
        let (boundary, weight) = match function {
            Sin => (
                times(ratio(-1, n), product(vec![raised(Sin, n - 1), f(Cos)])),
                ratio(n - 1, n),
            ),
            Cos => (
                times(ratio(1, n), product(vec![raised(Cos, n - 1), f(Sin)])),
                ratio(n - 1, n),
            ),
            Sinh => (
                times(ratio(1, n), product(vec![raised(Sinh, n - 1), f(Cosh)])),
                ratio(1 - n, n),
            ),
            Cosh => (
                times(ratio(1, n), product(vec![raised(Cosh, n - 1), f(Sinh)])),
                ratio(n - 1, n),
            ),
            Sec => (
                times(ratio(1, n - 1), product(vec![raised(Sec, n - 2), f(Tan)])),
                ratio(n - 2, n - 1),
            ),
            Csc => (
                times(ratio(-1, n - 1), product(vec![raised(Csc, n - 2), f(Cot)])),
                ratio(n - 2, n - 1),
            ),
            Tan => (times(ratio(1, n - 1), raised(Tan, n - 1)), Expr::number(-1)),
            Cot => (times(ratio(-1, n - 1), raised(Cot, n - 1)), Expr::number(-1)),
            Tanh => (times(ratio(-1, n - 1), raised(Tanh, n - 1)), one()),
            Coth => (times(ratio(-1, n - 1), raised(Coth, n - 1)), one()),
            _ => return None,
        };
        let lower = raised(function, n - 2);
        if weight.is_zero() {
            return Some(boundary);
        }
        let (rest, _) = self.integral(&lower, depth + 1, false)?;
        trace!(target: "integrate", %expr, %lower, depth, "reduced power");
        Some(sum(vec![boundary, times(weight, rest)]))
    }

    /// Products of two sines or cosines of different linear arguments become half sums:
    /// `sin A cos B = (sin(A + B) + sin(A - B)) / 2`.
    pub(super) fn by_product_to_sum(&self, expr: &Expr, depth: usize) -> Option<Expr> {
        use Function::*;
        let [a, b] = expr.operands_of(Operator::Multiply)? else {
            return None;
        };
        let (first, second) = (linear_call(a, self.var)?, linear_call(b, self.var)?);
        let ((f, a), (g, b)) = if first.0 == Cos && second.0 == Sin {
            (second, first)
        } else {
            (first, second)
        };
        let total = shrunk(sum(vec![a.clone(), b.clone()]));
        let (difference, flipped) = positive(shrunk(sub(a.clone(), b.clone())));
        if total.is_zero() || difference.is_zero() {
            return None;
        }
        let call = |function: Function, arg: &Expr| Expr::unary(function, arg.clone());
        let halved = match (f, g) {
            (Sin, Sin) => sub(call(Cos, &difference), call(Cos, &total)),
            (Cos, Cos) => sum(vec![call(Cos, &difference), call(Cos, &total)]),
            (Sin, Cos) if flipped => sub(call(Sin, &total), call(Sin, &difference)),
            (Sin, Cos) => sum(vec![call(Sin, &total), call(Sin, &difference)]),
            _ => return None,
        };
        let rewritten = shrunk(div(halved, Expr::number(2)));
        trace!(target: "integrate", %expr, %rewritten, "product to sum");
        Some(self.integral(&rewritten, depth + 1, false)?.0)
    }
}
