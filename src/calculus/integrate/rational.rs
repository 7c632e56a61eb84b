use tracing::trace;

use super::Integrator;
use crate::expr::{div, ln, product, sum, Expr, Function, Operator};
use crate::polynomial::{degree, divide_polynomials, Polynomial};

impl Integrator<'_> {
    /// Quotient of two polynomials in the variable: long division, the quotient termwise, and a
    /// logarithm when the remainder sits over a linear denominator.
    pub(super) fn rational(&self, expr: &Expr, depth: usize) -> Option<Expr> {
        let (numerator, denominator) = expr.binary(Operator::Divide)?;
        let bottom = degree(denominator, &[self.var])?;
        if bottom < 1 {
            return None;
        }
        degree(numerator, &[self.var])?;
        let (quotient, remainder) = divide_polynomials(numerator, denominator, &[self.var])?;
        trace!(target: "integrate", %quotient, %remainder, "polynomial division");

        let mut parts = Vec::with_capacity(2);
        if !quotient.is_zero() {
            parts.push(self.integral(&quotient, depth + 1, false)?.0);
        }
        if !remainder.is_zero() {
            if bottom == 1 {
                let slope = Polynomial::<Expr>::from_expr(denominator, self.var)?.coeff(1);
                let log = ln(Expr::unary(Function::Abs, denominator.clone()));
                parts.push(product(vec![div(remainder, slope), log]));
            } else if quotient.is_zero() {
                // nothing was divided out, so the same quotient would come back
                return None;
            } else {
                let proper = div(remainder, denominator.clone());
                parts.push(self.integral(&proper, depth + 1, true)?.0);
            }
        }
        Some(sum(parts))
    }
}
