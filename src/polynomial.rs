use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use num_traits::ToPrimitive;

use crate::expr::{
    as_rational, div, is_constant_name, mul, pow, sub, sum, Expr, Node, Operator,
};
use crate::numeral::Numeral;
use crate::simplify::{shrunk, times};

/// Coefficient ring of a univariate polynomial.
pub trait CoeffOps: Clone {
    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero(&self) -> bool;
    fn is_one(&self) -> bool;
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    fn div(&self, other: &Self) -> Self;
    fn neg(&self) -> Self;
    fn from_constant_expr(expr: &Expr) -> Option<Self>;
    fn to_expr(&self) -> Expr;
}

impl CoeffOps for Numeral {
    fn zero() -> Self {
        Numeral::zero()
    }

    fn one() -> Self {
        Numeral::one()
    }

    fn is_zero(&self) -> bool {
        Numeral::is_zero(self)
    }

    fn is_one(&self) -> bool {
        Numeral::is_one(self)
    }

    fn add(&self, other: &Self) -> Self {
        Numeral::add(self, other)
    }

    fn sub(&self, other: &Self) -> Self {
        Numeral::sub(self, other)
    }

    fn mul(&self, other: &Self) -> Self {
        Numeral::mul(self, other)
    }

    fn div(&self, other: &Self) -> Self {
        Numeral::div(self, other)
    }

    fn neg(&self) -> Self {
        Numeral::neg(self)
    }

    fn from_constant_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Number(n) => Some(n.clone()),
            other => as_rational(other),
        }
    }

    fn to_expr(&self) -> Expr {
        Expr::Number(self.clone())
    }
}

impl CoeffOps for Expr {
    fn zero() -> Self {
        Expr::number(0)
    }

    fn one() -> Self {
        Expr::number(1)
    }

    fn is_zero(&self) -> bool {
        Expr::is_zero(self)
    }

    fn is_one(&self) -> bool {
        Expr::is_one(self)
    }

    fn add(&self, other: &Self) -> Self {
        shrunk(crate::expr::add(self.clone(), other.clone()))
    }

    fn sub(&self, other: &Self) -> Self {
        shrunk(sub(self.clone(), other.clone()))
    }

    fn mul(&self, other: &Self) -> Self {
        shrunk(mul(self.clone(), other.clone()))
    }

    fn div(&self, other: &Self) -> Self {
        shrunk(div(self.clone(), other.clone()))
    }

    fn neg(&self) -> Self {
        shrunk(self.clone().negate())
    }

    fn from_constant_expr(expr: &Expr) -> Option<Self> {
        Some(expr.clone())
    }

    fn to_expr(&self) -> Expr {
        self.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynomial<C> {
    pub(crate) coeffs: BTreeMap<usize, C>,
}

pub type NumeralPolynomial = Polynomial<Numeral>;

impl<C: CoeffOps> Polynomial<C> {
    pub fn zero() -> Self {
        Polynomial {
            coeffs: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Polynomial::from_constant(C::one())
    }

    pub fn from_constant(c: C) -> Self {
        Polynomial::monomial(c, 0)
    }

    pub fn monomial(c: C, power: usize) -> Self {
        let mut coeffs = BTreeMap::new();
        if !c.is_zero() {
            coeffs.insert(power, c);
        }
        Polynomial { coeffs }
    }

    /// Coefficients from highest degree down, e.g. `[1, 0, -4]` for `x^2 - 4`.
    pub fn from_descending(coefficients: &[C]) -> Self {
        let top = coefficients.len().saturating_sub(1);
        let mut coeffs = BTreeMap::new();
        for (i, c) in coefficients.iter().enumerate() {
            if !c.is_zero() {
                coeffs.insert(top - i, c.clone());
            }
        }
        Polynomial { coeffs }
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.keys().next_back().copied()
    }

    pub fn leading_coeff(&self) -> C {
        self.degree()
            .and_then(|d| self.coeffs.get(&d).cloned())
            .unwrap_or_else(C::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coeff(&self, power: usize) -> C {
        self.coeffs.get(&power).cloned().unwrap_or_else(C::zero)
    }

    /// Coefficients from the leading one down to the constant term, zeros included.
    pub fn descending(&self) -> Vec<C> {
        match self.degree() {
            Some(d) => (0..=d).rev().map(|k| self.coeff(k)).collect(),
            None => vec![C::zero()],
        }
    }

    pub fn pow(&self, exp: usize) -> Self {
        let mut result = Polynomial::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = result * base.clone();
            }
            base = base.clone() * base;
            n /= 2;
        }
        result
    }

    pub fn scale(&self, k: &C) -> Self {
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            let scaled = coeff.mul(k);
            if !scaled.is_zero() {
                coeffs.insert(*exp, scaled);
            }
        }
        Polynomial { coeffs }
    }

    pub fn evaluate(&self, x: &C) -> C {
        self.descending()
            .iter()
            .fold(C::zero(), |acc, c| acc.mul(x).add(c))
    }

    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        let divisor_degree = divisor.degree()?;
        let divisor_lc = divisor.leading_coeff();
        let mut quotient = Polynomial::zero();
        let mut remainder = self.clone();
        while let Some(r_deg) = remainder.degree() {
            if r_deg < divisor_degree {
                break;
            }
            let term = Polynomial::monomial(
                remainder.leading_coeff().div(&divisor_lc),
                r_deg - divisor_degree,
            );
            remainder = remainder - term.clone() * divisor.clone();
            // The leading term cancels exactly even when the coefficient ring cannot show it.
            remainder.coeffs.remove(&r_deg);
            quotient = quotient + term;
        }
        Some((quotient, remainder))
    }

    pub fn from_expr(expr: &Expr, var: &str) -> Option<Self> {
        if !expr.find_identifier(var) {
            return C::from_constant_expr(expr).map(Polynomial::from_constant);
        }
        match expr {
            Expr::Identifier(name) if name == var => Some(Polynomial::monomial(C::one(), 1)),
            Expr::Node(Node { operator, operands }) => match (operator, operands.as_slice()) {
                (Operator::Add, terms) => terms
                    .iter()
                    .try_fold(Polynomial::zero(), |acc, t| Some(acc + Self::from_expr(t, var)?)),
                (Operator::Multiply, factors) => factors
                    .iter()
                    .try_fold(Polynomial::one(), |acc, f| Some(acc * Self::from_expr(f, var)?)),
                (Operator::Subtract, [a, b]) => {
                    Some(Self::from_expr(a, var)? - Self::from_expr(b, var)?)
                }
                (Operator::Divide, [a, b]) if !b.find_identifier(var) => {
                    let denominator = C::from_constant_expr(b)?;
                    if denominator.is_zero() {
                        return None;
                    }
                    Some(Self::from_expr(a, var)?.scale(&C::one().div(&denominator)))
                }
                (Operator::Raise, [base, exponent]) => {
                    let power = exponent
                        .as_number()
                        .and_then(Numeral::to_integer)?
                        .to_usize()?;
                    Some(Self::from_expr(base, var)?.pow(power))
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        let terms = self
            .coeffs
            .iter()
            .rev()
            .map(|(exp, coeff)| {
                let power = match exp {
                    0 => Expr::number(1),
                    1 => Expr::ident(var),
                    k => pow(Expr::ident(var), Expr::integer(*k as u64)),
                };
                times(coeff.to_expr(), power)
            })
            .collect();
        sum(terms)
    }
}

fn combine_entry<C: CoeffOps>(coeffs: &mut BTreeMap<usize, C>, exp: usize, coeff: C) {
    match coeffs.entry(exp) {
        Entry::Vacant(entry) => {
            if !coeff.is_zero() {
                entry.insert(coeff);
            }
        }
        Entry::Occupied(mut entry) => {
            let updated = entry.get().add(&coeff);
            if updated.is_zero() {
                entry.remove();
            } else {
                *entry.get_mut() = updated;
            }
        }
    }
}

impl<C: CoeffOps> std::ops::Add for Polynomial<C> {
    type Output = Polynomial<C>;
    fn add(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = self.coeffs;
        for (exp, coeff) in rhs.coeffs {
            combine_entry(&mut coeffs, exp, coeff);
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Sub for Polynomial<C> {
    type Output = Polynomial<C>;
    fn sub(self, rhs: Polynomial<C>) -> Polynomial<C> {
        self + (-rhs)
    }
}

impl<C: CoeffOps> std::ops::Mul for Polynomial<C> {
    type Output = Polynomial<C>;
    fn mul(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = BTreeMap::new();
        for (exp_a, coeff_a) in &self.coeffs {
            for (exp_b, coeff_b) in &rhs.coeffs {
                let product = coeff_a.mul(coeff_b);
                if !product.is_zero() {
                    combine_entry(&mut coeffs, exp_a + exp_b, product);
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Neg for Polynomial<C> {
    type Output = Polynomial<C>;
    fn neg(self) -> Polynomial<C> {
        let coeffs = self
            .coeffs
            .into_iter()
            .map(|(exp, coeff)| (exp, coeff.neg()))
            .filter(|(_, coeff)| !coeff.is_zero())
            .collect();
        Polynomial { coeffs }
    }
}

fn is_variable(name: &str, symbols: &[&str]) -> bool {
    if symbols.is_empty() {
        !is_constant_name(name)
    } else {
        symbols.contains(&name)
    }
}

fn mentions_variable(expr: &Expr, symbols: &[&str]) -> bool {
    match expr {
        Expr::Identifier(name) => is_variable(name, symbols),
        _ => expr.children().iter().any(|c| mentions_variable(c, symbols)),
    }
}

/// Total degree in `symbols`; every non-constant identifier counts when `symbols` is empty.
///
/// The zero polynomial has degree `-1`; `None` means the tree is not a polynomial in them.
pub fn degree(expr: &Expr, symbols: &[&str]) -> Option<i64> {
    if expr.is_zero() {
        return Some(-1);
    }
    degree_of(expr, symbols)
}

fn degree_of(expr: &Expr, symbols: &[&str]) -> Option<i64> {
    if !mentions_variable(expr, symbols) {
        return Some(0);
    }
    match expr {
        Expr::Identifier(_) => Some(1),
        Expr::Node(Node { operator, operands }) => match (operator, operands.as_slice()) {
            (Operator::Add, terms) => terms.iter().map(|t| degree_of(t, symbols)).try_fold(
                0,
                |acc, d| Some(acc.max(d?)),
            ),
            (Operator::Subtract, [a, b]) => {
                Some(degree_of(a, symbols)?.max(degree_of(b, symbols)?))
            }
            (Operator::Multiply, factors) => factors
                .iter()
                .map(|f| degree_of(f, symbols))
                .try_fold(0, |acc, d| Some(acc + d?)),
            (Operator::Divide, [a, b]) if !mentions_variable(b, symbols) => degree_of(a, symbols),
            (Operator::Raise, [base, exponent]) => {
                let n = exponent.as_number().and_then(Numeral::to_i64)?;
                if n < 0 {
                    return None;
                }
                Some(degree_of(base, symbols)? * n)
            }
            _ => None,
        },
        _ => None,
    }
}

pub fn is_polynomial(expr: &Expr) -> bool {
    degree(expr, &[]).is_some()
}

/// Largest integer exponent `symbol` is raised to anywhere in the tree; a bare occurrence
/// counts as one and an absent symbol as zero.
pub fn max_power(expr: &Expr, symbol: &str) -> i64 {
    match expr {
        Expr::Identifier(name) if name == symbol => 1,
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) if operands.len() == 2 && operands[0].is_identifier(symbol) => operands[1]
            .as_number()
            .and_then(Numeral::to_i64)
            .unwrap_or(1)
            .max(max_power(&operands[1], symbol)),
        _ => expr
            .children()
            .iter()
            .map(|c| max_power(c, symbol))
            .max()
            .unwrap_or(0),
    }
}

/// Numeral coefficients of a univariate polynomial, highest degree first with zeros filled in.
///
/// `None` when the tree holds more than one non-constant identifier or is not a polynomial in
/// it; with `fail_if_not_exact` every coefficient must also be an exact integer.
pub fn get_ordered_polynomial_coefficients(
    expr: &Expr,
    fail_if_not_exact: bool,
) -> Option<Vec<Numeral>> {
    let names: Vec<String> = expr
        .identifiers()
        .into_iter()
        .filter(|n| !is_constant_name(n))
        .collect();
    let var = match names.as_slice() {
        [] => "",
        [single] => single.as_str(),
        _ => return None,
    };
    let poly = NumeralPolynomial::from_expr(expr, var)?;
    let coefficients = poly.descending();
    if fail_if_not_exact && !coefficients.iter().all(Numeral::is_integer) {
        return None;
    }
    Some(coefficients)
}

fn main_variable(dividend: &Expr, divisor: &Expr, symbols: &[&str]) -> Option<String> {
    if let Some(first) = symbols.first() {
        return Some(first.to_string());
    }
    let mut names = divisor.identifiers();
    names.extend(dividend.identifiers());
    names.retain(|n| !is_constant_name(n));
    match names.len() {
        1 => names.into_iter().next(),
        _ => None,
    }
}

/// Polynomial long division in the first of `symbols`; the remaining identifiers are treated as
/// coefficients. Returns `(quotient, remainder)`, both shrunk.
pub fn divide_polynomials(
    dividend: &Expr,
    divisor: &Expr,
    symbols: &[&str],
) -> Option<(Expr, Expr)> {
    let var = main_variable(dividend, divisor, symbols)?;
    let top = Polynomial::<Expr>::from_expr(dividend, &var)?;
    let bottom = Polynomial::<Expr>::from_expr(divisor, &var)?;
    let (quotient, remainder) = top.div_rem(&bottom)?;
    Some((shrunk(quotient.to_expr(&var)), shrunk(remainder.to_expr(&var))))
}

/// Rewrites a polynomial in `symbol` as a sum of descending powers; other trees are returned
/// as they are.
pub fn order_polynomial(expr: &Expr, symbol: &str) -> Expr {
    match Polynomial::<Expr>::from_expr(expr, symbol) {
        Some(poly) if !poly.is_zero() => poly.to_expr(symbol),
        _ => expr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horner_matches_direct_evaluation() {
        let poly = NumeralPolynomial::from_descending(&[
            Numeral::integer(2),
            Numeral::integer(-3),
            Numeral::integer(1),
        ]);
        assert_eq!(poly.evaluate(&Numeral::integer(3)), Numeral::integer(10));
        assert_eq!(poly.degree(), Some(2));
    }

    #[test]
    fn long_division_leaves_a_remainder() {
        let dividend = NumeralPolynomial::from_descending(&[
            Numeral::integer(1),
            Numeral::integer(0),
            Numeral::integer(-3),
        ]);
        let divisor =
            NumeralPolynomial::from_descending(&[Numeral::integer(1), Numeral::integer(-1)]);
        let (q, r) = dividend.div_rem(&divisor).expect("nonzero divisor");
        assert_eq!(q.descending(), vec![Numeral::integer(1), Numeral::integer(1)]);
        assert_eq!(r.descending(), vec![Numeral::integer(-2)]);
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let p = NumeralPolynomial::one();
        assert!(p.div_rem(&NumeralPolynomial::zero()).is_none());
    }
}
