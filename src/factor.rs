//! Factoring of sums: common factors, integer content, special products, quadratics, rational
//! roots and grouping.
//!
//! Every entry point takes a tree in either subtraction or sum form and returns the factored
//! tree with a flag; when the shape is not recognised the input comes back unchanged.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use tracing::trace;

use crate::config::QuadraticTolerance;
use crate::expr::{
    as_rational, is_constant_name, pow, product, rational_expr, sum, Expr, Operator,
};
use crate::numeral::Numeral;
use crate::polynomial::{get_ordered_polynomial_coefficients, order_polynomial, NumeralPolynomial};
use crate::simplify::{
    bottom_up, cancel_counting_bases, convert_add_to_subtract, convert_subtract_to_add,
    factors_of, merge, shrunk, split_coefficient, split_power, times, with_coefficient,
};

/// Pulls the factor shared by every addend out of each sum: `x + y * x` becomes `x * (1 + y)`.
pub fn factor(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| match e.operands_of(Operator::Add) {
        Some(terms) => match common_factor(terms, false) {
            Some((common, rest)) if !rest.iter().all(|r| matches!(r, Expr::Number(_))) => {
                (times(common, sum(rest)), true)
            }
            _ => (e, false),
        },
        None => (e, false),
    })
}

/// Divides out the integer content of a sum: `4x + -2` becomes `2 * (2x - 1)`.
pub fn factor_polynomial_by_gcd(expr: Expr) -> (Expr, bool) {
    let work = prepared(expr.clone());
    let Some(terms) = work.operands_of(Operator::Add) else {
        return (expr, false);
    };
    match integer_content(terms) {
        Some((content, rest)) => (
            product(vec![Expr::Number(content), descending(sum(rest))]),
            true,
        ),
        None => (expr, false),
    }
}

/// `a^2 - b^2` becomes `(a + b) * (a - b)` when both terms are exact squares.
pub fn factor_difference_of_squares(expr: Expr) -> (Expr, bool) {
    let work = prepared(expr.clone());
    let Some([first, second]) = two_terms(&work) else {
        return (expr, false);
    };
    let (positive, negative) = match (first.is_negative(), second.is_negative()) {
        (false, true) => (first, second),
        (true, false) => (second, first),
        _ => return (expr, false),
    };
    let (Some(a), Some(b)) = (
        exact_root(positive.clone(), 2),
        exact_root(negative.clone().abs_term(), 2),
    ) else {
        return (expr, false);
    };
    trace!(target: "factor", "difference of squares");
    let plus = sum(vec![a.clone(), b.clone()]);
    let minus = Expr::node(Operator::Subtract, vec![a, b]);
    (product(vec![plus, minus]), true)
}

/// `a^3 + b^3` and `a^3 - b^3` split into a linear and a quadratic factor.
pub fn factor_difference_of_cubes(expr: Expr) -> (Expr, bool) {
    let work = prepared(expr.clone());
    let Some([first, second]) = two_terms(&work) else {
        return (expr, false);
    };
    let (lead, other) = match (first.is_negative(), second.is_negative()) {
        (true, true) => return (expr, false),
        (true, false) => (second, first),
        _ => (first, second),
    };
    let subtracting = other.is_negative();
    let (Some(a), Some(b)) = (
        exact_root(lead.clone(), 3),
        exact_root(other.clone().abs_term(), 3),
    ) else {
        return (expr, false);
    };
    let square_a = shrunk(pow(a.clone(), Expr::number(2)));
    let square_b = shrunk(pow(b.clone(), Expr::number(2)));
    let cross = shrunk(times(a.clone(), b.clone()));
    let (linear, quadratic) = if subtracting {
        (
            Expr::node(Operator::Subtract, vec![a, b]),
            sum(vec![square_a, cross, square_b]),
        )
    } else {
        (
            sum(vec![a, b]),
            restored(sum(vec![square_a, cross.negate(), square_b])),
        )
    };
    trace!(target: "factor", subtracting, "sum or difference of cubes");
    (product(vec![linear, quadratic]), true)
}

/// Factors `ax^2 + bx + c` with integer coefficients over the rationals.
///
/// A zero discriminant gives a square of a linear factor, a positive square discriminant two
/// linear factors. A zero constant term is left to the common-factor routines.
pub fn factor_quadratic(expr: Expr) -> (Expr, bool) {
    let Some((var, coefficients)) = univariate(&expr, true) else {
        return (expr, false);
    };
    let [a, b, c] = match <[Numeral; 3]>::try_from(coefficients) {
        Ok(abc) => abc,
        Err(_) => return (expr, false),
    };
    if c.is_zero() {
        return (expr, false);
    }
    let discriminant = b.mul(&b).sub(&Numeral::integer(4).mul(&a).mul(&c));
    if discriminant.is_zero() {
        return match perfect_square(&var, &a, &b, &c) {
            Some(square) => (square, true),
            None => (expr, false),
        };
    }
    if discriminant.is_negative() {
        return (expr, false);
    }
    let Some(root) = discriminant.sqrt_exact() else {
        return (expr, false);
    };
    let two_a = Numeral::integer(2).mul(&a);
    let first = b.neg().add(&root).div(&two_a);
    let second = b.neg().sub(&root).div(&two_a);
    let (Some(left), Some(right)) = (root_factor(&var, &first), root_factor(&var, &second))
    else {
        return (expr, false);
    };
    let scale = a.div(&left.0.mul(&right.0));
    let mut factors = Vec::with_capacity(3);
    if !scale.is_one() {
        factors.push(Expr::Number(scale));
    }
    factors.push(left.1);
    factors.push(right.1);
    trace!(target: "factor", %var, "rational quadratic roots");
    (product(factors), true)
}

/// Quadratic factoring that accepts inexact coefficients and irrational roots, written with
/// floating numerals. A discriminant within `tolerance` of zero counts as a perfect square.
pub fn factor_quadratic_whatever(expr: Expr, tolerance: QuadraticTolerance) -> (Expr, bool) {
    let (exact, changed) = factor_quadratic(expr);
    if changed {
        return (exact, true);
    }
    let expr = exact;
    let Some((var, coefficients)) = univariate(&expr, false) else {
        return (expr, false);
    };
    let [a, b, c] = match <[Numeral; 3]>::try_from(coefficients) {
        Ok(abc) => abc.map(|n| n.to_f64()),
        Err(_) => return (expr, false),
    };
    if a == 0.0 || !a.is_finite() || !b.is_finite() || !c.is_finite() {
        return (expr, false);
    }
    let discriminant = b * b - 4.0 * a * c;
    let lead = |mut factors: Vec<Expr>| {
        if a != 1.0 {
            factors.insert(0, Expr::Number(Numeral::float(a)));
        }
        product(factors)
    };
    if tolerance.is_zero(discriminant, b * b) {
        let shift = b / (2.0 * a);
        let base = linear(&var, Numeral::one(), Numeral::float(shift));
        trace!(target: "factor", %var, "near-square quadratic");
        return (lead(vec![pow(base, Expr::number(2))]), true);
    }
    if discriminant < 0.0 {
        return (expr, false);
    }
    let root = discriminant.sqrt();
    let first = (-b + root) / (2.0 * a);
    let second = (-b - root) / (2.0 * a);
    let factors = vec![
        linear(&var, Numeral::one(), Numeral::float(-first)),
        linear(&var, Numeral::one(), Numeral::float(-second)),
    ];
    trace!(target: "factor", %var, first, second, "floating quadratic roots");
    (lead(factors), true)
}

/// Splits off one linear factor `(qx - p)` for a rational root `p/q` found among the
/// candidates the leading and constant coefficients allow.
pub fn factor_polynomial_by_rational_roots(expr: Expr) -> (Expr, bool) {
    let Some((var, coefficients)) = univariate(&expr, true) else {
        return (expr, false);
    };
    if coefficients.len() < 3 {
        return (expr, false);
    }
    let poly = NumeralPolynomial::from_descending(&coefficients);
    let Some(root) = find_rational_root(&poly) else {
        return (expr, false);
    };
    let Some(r) = root.as_rational() else {
        return (expr, false);
    };
    let q = Numeral::integer(r.denom().clone());
    let p = Numeral::integer(r.numer().clone());
    let divisor = NumeralPolynomial::from_descending(&[q.clone(), p.neg()]);
    let Some((quotient, remainder)) = poly.div_rem(&divisor) else {
        return (expr, false);
    };
    if !remainder.is_zero() {
        return (expr, false);
    }
    trace!(target: "factor", %var, %root, "rational root");
    let factors = vec![linear(&var, q, p.neg()), restored(quotient.to_expr(&var))];
    (product(factors), true)
}

/// Four addends regrouped in pairs: `x^3 + 2x^2 - 9x - 18` becomes `(x^2 - 9) * (x + 2)`.
pub fn factor_polynomial_by_grouping(expr: Expr) -> (Expr, bool) {
    let work = prepared(expr.clone());
    let Some(terms) = work.operands_of(Operator::Add) else {
        return (expr, false);
    };
    if terms.len() != 4 {
        return (expr, false);
    }
    let (content, terms) = match integer_content(terms) {
        Some((content, rest)) => (Some(content), rest),
        None => (None, terms.to_vec()),
    };
    for [i, j, k, l] in [[0, 1, 2, 3], [0, 2, 1, 3], [0, 3, 1, 2]] {
        let (left, shared) = pair_factor(&terms[i], &terms[j]);
        let (right, other) = pair_factor(&terms[k], &terms[l]);
        if matches!(shared, Expr::Number(_)) {
            continue;
        }
        let group = if shared == other {
            sum(vec![left, right])
        } else if shared == shrunk(other.negate()) {
            sum(vec![left, right.negate()])
        } else {
            continue;
        };
        trace!(target: "factor", pairing = ?[i, j, k, l], "grouping");
        let mut factors = Vec::with_capacity(3);
        factors.extend(content.map(Expr::Number));
        factors.push(restored(group));
        factors.push(shared);
        return (product(factors), true);
    }
    (expr, false)
}

/// Shrink stage: factors the sums of a quotient and keeps the result only when a factor
/// cancels between numerator and denominator.
pub(crate) fn cancel_common_factors(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut |e| {
        let Some((numerator, denominator)) = e.binary(Operator::Divide) else {
            return (e, false);
        };
        if numerator.is_nan() || denominator.is_zero() {
            return (e, false);
        }
        if !has_sum_factor(numerator) && !has_sum_factor(denominator) {
            return (e, false);
        }
        let top = factored_side(numerator.clone());
        let bottom = factored_side(denominator.clone());
        let (cancelled, hit) = cancel_counting_bases(top, bottom);
        if hit {
            trace!(target: "factor", "common factor cancelled");
            (cancelled, true)
        } else {
            (e, false)
        }
    })
}

fn has_sum_factor(expr: &Expr) -> bool {
    expr.is_op(Operator::Add)
        || expr
            .operands_of(Operator::Multiply)
            .is_some_and(|fs| fs.iter().any(|f| f.is_op(Operator::Add)))
}

fn factored_side(side: Expr) -> Expr {
    let factors: Vec<Expr> = factors_of(side)
        .into_iter()
        .flat_map(|f| {
            if f.is_op(Operator::Add) {
                factors_of(prepared(factor_sum(f)))
            } else {
                vec![f]
            }
        })
        .collect();
    product(factors)
}

fn factor_sum(sum_expr: Expr) -> Expr {
    let attempts: [fn(Expr) -> (Expr, bool); 5] = [
        factor_polynomial_by_gcd,
        factor_difference_of_squares,
        factor_quadratic,
        factor_polynomial_by_rational_roots,
        factor,
    ];
    for attempt in attempts {
        let (result, changed) = attempt(sum_expr.clone());
        if changed {
            return result;
        }
    }
    sum_expr
}

fn prepared(expr: Expr) -> Expr {
    let (expr, _) = convert_subtract_to_add(expr);
    merge(expr).0
}

fn restored(expr: Expr) -> Expr {
    convert_add_to_subtract(expr).0
}

/// A univariate sum in descending powers and subtraction form, leading term kept first even
/// when it is negative: `-x^2 + x - 1`.
fn descending(expr: Expr) -> Expr {
    let names = expr.identifiers();
    let ordered = match names.iter().next() {
        Some(name) if names.len() == 1 => order_polynomial(&expr, name),
        _ => return restored(expr),
    };
    let Some(terms) = ordered.operands_of(Operator::Add) else {
        return restored(ordered);
    };
    let mut run: Vec<Expr> = Vec::new();
    for term in terms {
        if run.is_empty() || !term.is_negative() {
            run.push(term.clone());
        } else {
            let left = sum(std::mem::take(&mut run));
            run.push(Expr::node(Operator::Subtract, vec![left, term.clone().abs_term()]));
        }
    }
    sum(run)
}

fn two_terms(expr: &Expr) -> Option<[Expr; 2]> {
    match expr.operands_of(Operator::Add)? {
        [a, b] => Some([a.clone(), b.clone()]),
        _ => None,
    }
}

fn univariate(expr: &Expr, exact: bool) -> Option<(String, Vec<Numeral>)> {
    let mut names = expr.identifiers();
    names.retain(|n| !is_constant_name(n));
    let var = match names.len() {
        1 => names.into_iter().next()?,
        _ => return None,
    };
    let coefficients = get_ordered_polynomial_coefficients(expr, exact)?;
    Some((var, coefficients))
}

fn linear(var: &str, p: Numeral, q: Numeral) -> Expr {
    let mut terms = vec![with_coefficient(p, Expr::ident(var))];
    if !q.is_zero() {
        terms.push(Expr::Number(q));
    }
    restored(sum(terms))
}

fn root_factor(var: &str, root: &Numeral) -> Option<(Numeral, Expr)> {
    let r = root.as_rational()?;
    let d = Numeral::integer(r.denom().clone());
    let n = Numeral::integer(r.numer().clone());
    Some((d.clone(), linear(var, d, n.neg())))
}

fn perfect_square(var: &str, a: &Numeral, b: &Numeral, c: &Numeral) -> Option<Expr> {
    let mut content = a.gcd(b)?.gcd(c)?;
    if a.is_negative() {
        content = content.neg();
    }
    let p = a.div(&content).sqrt_exact()?;
    let mut q = c.div(&content).sqrt_exact()?;
    if b.div(&content).is_negative() {
        q = q.neg();
    }
    let square = pow(linear(var, p, q), Expr::number(2));
    trace!(target: "factor", %var, "perfect square trinomial");
    Some(if content.is_one() {
        square
    } else {
        product(vec![Expr::Number(content), square])
    })
}

/// Exact `n`th root of a monomial: numerals by their exact root, powers by dividing the
/// exponent.
fn exact_root(term: Expr, n: u32) -> Option<Expr> {
    let (coefficient, rest) = split_coefficient(term);
    let coefficient = coefficient.nth_root_exact(n)?;
    let mut factors = Vec::new();
    if !rest.is_one() {
        for factor in factors_of(rest) {
            let (base, exponent) = split_power(factor);
            let e = as_rational(&exponent)?;
            let reduced = e.div(&Numeral::integer(n));
            if !reduced.is_integer() || reduced.is_negative() {
                return None;
            }
            if reduced.is_one() {
                factors.push(base);
            } else if !reduced.is_zero() {
                factors.push(pow(base, rational_expr(&reduced)));
            }
        }
    }
    Some(with_coefficient(coefficient, product(factors)))
}

fn pair_factor(a: &Expr, b: &Expr) -> (Expr, Expr) {
    let pair = [a.clone(), b.clone()];
    match common_factor(&pair, true) {
        Some((common, rest)) => (common, shrunk(sum(rest))),
        None => (Expr::number(1), shrunk(sum(pair.to_vec()))),
    }
}

fn integer_content(terms: &[Expr]) -> Option<(Numeral, Vec<Expr>)> {
    let split: Vec<(Numeral, Expr)> = terms.iter().cloned().map(split_coefficient).collect();
    let content = split
        .iter()
        .try_fold(Numeral::zero(), |acc, (c, _)| acc.gcd(c))?;
    if content.is_zero() || content.is_one() {
        return None;
    }
    let rest = split
        .into_iter()
        .map(|(c, r)| with_coefficient(c.div(&content), r))
        .collect();
    Some((content, rest))
}

struct Monomial {
    coefficient: Numeral,
    powers: Vec<(Expr, Expr)>,
}

fn monomial(term: Expr) -> Monomial {
    let (coefficient, rest) = split_coefficient(term);
    let powers = if rest.is_one() {
        Vec::new()
    } else {
        factors_of(rest).into_iter().map(split_power).collect()
    };
    Monomial {
        coefficient,
        powers,
    }
}

/// Factor shared by every term: the integer gcd of the coefficients times each base at its
/// smallest exponent. With `lead_positive` the first remaining term keeps a positive sign.
fn common_factor(terms: &[Expr], lead_positive: bool) -> Option<(Expr, Vec<Expr>)> {
    if terms.len() < 2 {
        return None;
    }
    let split: Vec<Monomial> = terms.iter().cloned().map(monomial).collect();
    let mut content = split
        .iter()
        .try_fold(Numeral::zero(), |acc, m| acc.gcd(&m.coefficient))
        .filter(|g| !g.is_zero())
        .unwrap_or_else(Numeral::one);
    if lead_positive && split[0].coefficient.is_negative() {
        content = content.neg();
    }

    let mut shared: Vec<(Expr, Expr)> = Vec::new();
    for (base, _) in &split[0].powers {
        if shared.iter().any(|(b, _)| b == base) {
            continue;
        }
        let exponents: Option<Vec<&Expr>> = split
            .iter()
            .map(|m| m.powers.iter().find(|(b, _)| b == base).map(|(_, e)| e))
            .collect();
        if let Some(exponent) = exponents.and_then(|es| smallest_exponent(&es)) {
            shared.push((base.clone(), exponent));
        }
    }
    if content.is_one() && shared.is_empty() {
        return None;
    }

    let rest = split
        .into_iter()
        .map(|m| {
            let factors: Vec<Expr> = m
                .powers
                .into_iter()
                .filter_map(|(base, exponent)| remaining_power(&shared, base, exponent))
                .collect();
            with_coefficient(m.coefficient.div(&content), product(factors))
        })
        .collect();
    let common = with_coefficient(
        content,
        product(shared.into_iter().map(|(b, e)| power_of(b, e)).collect()),
    );
    Some((common, rest))
}

fn smallest_exponent(exponents: &[&Expr]) -> Option<Expr> {
    let first = exponents.first()?;
    if exponents.iter().all(|e| e == first) {
        return Some((*first).clone());
    }
    let values: Option<Vec<Numeral>> = exponents.iter().map(|e| as_rational(e)).collect();
    let least = values?.into_iter().min()?;
    (least.is_integer() && !least.is_negative() && !least.is_zero())
        .then(|| rational_expr(&least))
}

fn remaining_power(shared: &[(Expr, Expr)], base: Expr, exponent: Expr) -> Option<Expr> {
    let Some((_, taken)) = shared.iter().find(|(b, _)| b == &base) else {
        return Some(power_of(base, exponent));
    };
    if &exponent == taken {
        return None;
    }
    let left = as_rational(&exponent)?.sub(&as_rational(taken)?);
    Some(power_of(base, rational_expr(&left)))
}

fn power_of(base: Expr, exponent: Expr) -> Expr {
    if exponent.is_one() {
        base
    } else {
        pow(base, exponent)
    }
}

fn find_rational_root(poly: &NumeralPolynomial) -> Option<Numeral> {
    let leading = poly.leading_coeff().to_integer()?;
    let constant = poly.coeff(0).to_integer()?;
    if constant.is_zero() {
        return Some(Numeral::zero());
    }
    let mut candidates = Vec::new();
    for p in divisors(&constant) {
        for q in divisors(&leading) {
            let candidate = Numeral::integer(p.clone()).div(&Numeral::integer(q));
            candidates.push(candidate.neg());
            candidates.push(candidate);
        }
    }
    candidates.sort();
    candidates.dedup();
    candidates
        .into_iter()
        .find(|candidate| poly.evaluate(candidate).is_zero())
}

fn divisors(n: &BigInt) -> Vec<BigInt> {
    let abs_n = n.abs();
    let mut result = Vec::new();
    let mut d = BigInt::one();
    while &d * &d <= abs_n {
        if (&abs_n % &d).is_zero() {
            let other = &abs_n / &d;
            if other != d {
                result.push(other);
            }
            result.push(d.clone());
        }
        d += 1;
    }
    result.sort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn run(pass: fn(Expr) -> (Expr, bool), input: &str) -> (String, bool) {
        let (result, changed) = pass(parse_expr(input).expect("parse input"));
        (result.to_string(), changed)
    }

    #[test]
    fn divisors_are_sorted() {
        let found: Vec<i64> = divisors(&BigInt::from(-12))
            .iter()
            .map(|d| d.to_string().parse().expect("small divisor"))
            .collect();
        assert_eq!(found, vec![1, 2, 3, 4, 6, 12]);
    }

    #[test]
    fn exact_roots_of_monomials() {
        let root = exact_root(parse_expr("27 * x^3").expect("parse input"), 3);
        assert_eq!(root.map(|r| r.to_string()), Some("3x".to_string()));
        assert!(exact_root(parse_expr("x^3").expect("parse input"), 2).is_none());
    }

    #[test]
    fn shared_factor_needs_every_term() {
        assert_eq!(run(factor, "x + y * x"), ("x * (1 + y)".to_string(), true));
        assert_eq!(run(factor, "x + y"), ("x + y".to_string(), false));
        assert_eq!(run(factor, "x + x"), ("x + x".to_string(), false));
    }

    #[test]
    fn quotient_factors_cancel() {
        let expr = parse_expr("(x^2 - 1) / (x - 1)").expect("parse input");
        let (converted, _) = convert_subtract_to_add(expr);
        let (result, changed) = cancel_common_factors(converted);
        assert!(changed);
        assert_eq!(restored(result).to_string(), "x + 1");
    }
}
