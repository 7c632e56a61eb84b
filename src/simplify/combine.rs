use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use super::bottom_up;
use crate::expr::{
    as_rational, div, one, pow, product, rational_expr, sum, zero, Expr, Function, Node, Operator,
};
use crate::numeral::{ComplexNumeral, Numeral};

/// Folds numerals and gathers like terms.
///
/// Sums add their numerals and the coefficients of terms that agree apart from a numeral
/// factor, and apply the Pythagorean identities. Products multiply their numerals, add the
/// exponents of equal bases and apply the reciprocal and quotient identities of the circular
/// and hyperbolic functions. Powers of numerals, products and quotients are evaluated or
/// distributed, and bitwise operators fold on integers.
pub fn combine(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut combine_node)
}

fn combine_node(expr: Expr) -> (Expr, bool) {
    let Expr::Node(Node { operator, operands }) = expr else {
        return (expr, false);
    };
    match operator {
        Operator::Add => combine_sum(operands),
        Operator::Multiply => combine_product(operands),
        Operator::Raise => combine_power(operands),
        Operator::Subtract => combine_difference(operands),
        Operator::Divide => combine_quotient(operands),
        _ => fold_integers(operator, operands),
    }
}

/// Splits the numeral factors off a term: `3 * x * y` is `(3, x * y)` and `(2x) / (3y)` is
/// `(2/3, x / y)`.
pub(crate) fn split_coefficient(term: Expr) -> (Numeral, Expr) {
    match term {
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let mut coefficient = Numeral::one();
            let mut rest = Vec::with_capacity(operands.len());
            for operand in operands {
                match operand {
                    Expr::Number(n) => coefficient = coefficient.mul(&n),
                    other => rest.push(other),
                }
            }
            (coefficient, product(rest))
        }
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([numerator, denominator]) => split_quotient(numerator, denominator),
            Err(operands) => (Numeral::one(), Expr::node(Operator::Divide, operands)),
        },
        Expr::Number(n) => (n, one()),
        other => (Numeral::one(), other),
    }
}

fn split_quotient(numerator: Expr, denominator: Expr) -> (Numeral, Expr) {
    let (top, upper) = split_coefficient(numerator);
    let (bottom, lower) = split_coefficient(denominator);
    if bottom.is_zero() || bottom.is_nan() || top.is_nan() {
        let numerator = with_coefficient(top, upper);
        let denominator = with_coefficient(bottom, lower);
        return (Numeral::one(), div(numerator, denominator));
    }
    let rest = if lower.is_one() {
        upper
    } else {
        div(upper, lower)
    };
    (top.div(&bottom), rest)
}

/// Inverse of `split_coefficient`; a zero coefficient drops the term and a fractional one
/// goes below a quotient bar.
pub(crate) fn with_coefficient(coefficient: Numeral, rest: Expr) -> Expr {
    if coefficient.is_zero() {
        return zero();
    }
    let fraction = coefficient
        .as_rational()
        .filter(|r| !r.is_integer())
        .map(|r| (Numeral::integer(r.numer().clone()), Numeral::integer(r.denom().clone())));
    if let Some((numer, denom)) = fraction {
        return match rest.binary(Operator::Divide) {
            Some((upper, lower)) => div(
                with_coefficient(numer, upper.clone()),
                with_coefficient(denom, lower.clone()),
            ),
            None => div(with_coefficient(numer, rest), Expr::Number(denom)),
        };
    }
    if coefficient.is_one() {
        return rest;
    }
    if rest.is_one() {
        return Expr::Number(coefficient);
    }
    match rest {
        Expr::Node(Node {
            operator: Operator::Multiply,
            mut operands,
        }) => {
            operands.insert(0, Expr::Number(coefficient));
            product(operands)
        }
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([upper, lower]) => div(with_coefficient(coefficient, upper), lower),
            Err(operands) => product(vec![
                Expr::Number(coefficient),
                Expr::node(Operator::Divide, operands),
            ]),
        },
        other => product(vec![Expr::Number(coefficient), other]),
    }
}

pub(crate) fn split_power(factor: Expr) -> (Expr, Expr) {
    match factor {
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) => match <[Expr; 2]>::try_from(operands) {
            Ok([base, exponent]) => (base, exponent),
            Err(operands) => (Expr::node(Operator::Raise, operands), one()),
        },
        other => (other, one()),
    }
}

fn is_numeral(term: &Expr) -> bool {
    matches!(term, Expr::Number(_)) || as_rational(term).is_some()
}

fn numeral_value(term: &Expr) -> Option<Numeral> {
    match term {
        Expr::Number(n) => Some(n.clone()),
        other => as_rational(other),
    }
}

fn complex_value(term: &Expr) -> Option<ComplexNumeral> {
    match term {
        Expr::Complex(c) => Some(c.clone()),
        other => numeral_value(other).map(ComplexNumeral::from_real),
    }
}

fn complex_expr(value: ComplexNumeral) -> Expr {
    if value.is_real() {
        rational_expr(&value.re)
    } else {
        Expr::Complex(value)
    }
}

/// Folds every numeral of a sum or product holding a complex numeral into one constant, placed
/// last in a sum and first in a product. Other operands are left for the usual collection.
fn fold_complex(operator: Operator, operands: Vec<Expr>) -> (Vec<Expr>, bool) {
    let constant = |op: &Expr| match operator {
        Operator::Multiply => matches!(op, Expr::Number(_) | Expr::Complex(_)),
        _ => complex_value(op).is_some(),
    };
    let (constants, mut rest): (Vec<Expr>, Vec<Expr>) = operands.into_iter().partition(constant);
    let mut total = match operator {
        Operator::Multiply => ComplexNumeral::from_real(Numeral::one()),
        _ => ComplexNumeral::from_real(Numeral::zero()),
    };
    for value in constants.iter().filter_map(complex_value) {
        total = match operator {
            Operator::Multiply => total.mul(&value),
            _ => total.add(&value),
        };
    }
    let folded = match operator {
        Operator::Multiply if total.is_real() => Expr::Number(total.re),
        _ => complex_expr(total),
    };
    let changed = constants.len() > 1;
    match operator {
        Operator::Multiply => rest.insert(0, folded),
        _ => rest.push(folded),
    }
    (rest, changed)
}

pub(crate) fn complex_quotient(numerator: &Expr, denominator: &Expr) -> Option<Expr> {
    if !matches!(numerator, Expr::Complex(_)) && !matches!(denominator, Expr::Complex(_)) {
        return None;
    }
    let top = complex_value(numerator)?;
    let bottom = complex_value(denominator)?;
    if bottom.is_zero() {
        return None;
    }
    Some(complex_expr(top.div(&bottom)))
}

fn combine_quotient(operands: Vec<Expr>) -> (Expr, bool) {
    match operands.as_slice() {
        [numerator, denominator] => match complex_quotient(numerator, denominator) {
            Some(value) => (value, true),
            None => (Expr::node(Operator::Divide, operands), false),
        },
        _ => (Expr::node(Operator::Divide, operands), false),
    }
}

struct LikeTerms {
    rest: Expr,
    coefficient: Numeral,
    original: Option<Expr>,
}

fn combine_sum(operands: Vec<Expr>) -> (Expr, bool) {
    if operands.iter().any(Expr::is_nan) {
        return (Expr::nan(), true);
    }
    let mut folded = false;
    let mut operands = operands;
    if operands.iter().any(|op| matches!(op, Expr::Complex(_))) {
        (operands, folded) = fold_complex(Operator::Add, operands);
    }
    let complex = operands.iter().any(|op| matches!(op, Expr::Complex(_)));
    let constant_term = |op: &Expr| is_numeral(op) || matches!(op, Expr::Complex(_));
    let trailing = operands.last().is_some_and(constant_term);
    let (numerals, terms): (Vec<Expr>, Vec<Expr>) = operands.into_iter().partition(constant_term);
    let mut changed = folded || numerals.len() > 1 || (numerals.len() == 1 && !trailing);
    let mut constant: Option<Expr> = None;
    if numerals.len() == 1 {
        constant = numerals.into_iter().next();
    } else if !numerals.is_empty() {
        let mut total = Numeral::zero();
        for n in numerals.iter().filter_map(numeral_value) {
            total = total.add(&n);
        }
        if total.is_nan() {
            return (Expr::nan(), true);
        }
        constant = Some(rational_expr(&total));
    }

    let mut groups: Vec<LikeTerms> = Vec::new();
    for term in terms {
        let original = term.clone();
        let (coefficient, rest) = split_coefficient(term);
        match groups.iter_mut().find(|g| g.rest == rest) {
            Some(group) => {
                group.coefficient = group.coefficient.add(&coefficient);
                group.original = None;
                changed = true;
            }
            None => groups.push(LikeTerms {
                rest,
                coefficient,
                original: Some(original),
            }),
        }
    }

    let mut constant_value = constant.as_ref().and_then(numeral_value);
    if !complex && pythagorean(&mut groups, &mut constant_value) {
        changed = true;
        constant = constant_value
            .filter(|n| !n.is_zero())
            .map(|n| rational_expr(&n));
    }

    let mut out: Vec<Expr> = groups
        .into_iter()
        .map(|g| match g.original {
            Some(term) => term,
            None => with_coefficient(g.coefficient, g.rest),
        })
        .filter(|term| !term.is_zero())
        .collect();
    out.extend(constant);
    (sum(out), changed)
}

fn squared_call(rest: &Expr) -> Option<(&Function, &Expr)> {
    let (base, exponent) = rest.binary(Operator::Raise)?;
    if exponent.as_number()? != &Numeral::integer(2) {
        return None;
    }
    let call = base.as_call()?;
    match call.args.as_slice() {
        [arg] => Some((&call.function, arg)),
        _ => None,
    }
}

fn square_of(function: Function, arg: Expr) -> Expr {
    pow(Expr::unary(function, arg), Expr::number(2))
}

fn pythagorean(groups: &mut Vec<LikeTerms>, constant: &mut Option<Numeral>) -> bool {
    use Function::*;
    // (first, second, coefficient of second relative to first)
    const PAIRS: [(Function, Function, i64); 6] = [
        (Sin, Cos, 1),
        (Cosh, Sinh, -1),
        (Tanh, Sech, 1),
        (Coth, Csch, -1),
        (Sec, Tan, -1),
        (Csc, Cot, -1),
    ];
    for i in 0..groups.len() {
        for j in 0..groups.len() {
            if i == j || !groups[i].coefficient.is_exact() {
                continue;
            }
            let (Some((f, u)), Some((g, v))) =
                (squared_call(&groups[i].rest), squared_call(&groups[j].rest))
            else {
                continue;
            };
            if u != v {
                continue;
            }
            let hit = PAIRS.iter().any(|(a, b, sign)| {
                a == f
                    && b == g
                    && groups[j].coefficient
                        == groups[i].coefficient.mul(&Numeral::integer(*sign))
            });
            if hit {
                let c = groups[i].coefficient.clone();
                let total = constant.take().unwrap_or_else(Numeral::zero).add(&c);
                *constant = Some(total);
                let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                groups.remove(hi);
                groups.remove(lo);
                return true;
            }
        }
    }
    let Some(n) = constant.clone().filter(Numeral::is_exact) else {
        return false;
    };
    for group in groups.iter_mut() {
        let c = group.coefficient.clone();
        let Some((f, u)) = squared_call(&group.rest) else {
            continue;
        };
        let positive = !c.is_negative() && !c.is_zero();
        let rewrite = match f {
            Tan if positive && n >= c => Some((Sec, c.clone(), n.sub(&c))),
            Cot if positive && n >= c => Some((Csc, c.clone(), n.sub(&c))),
            Sec if positive && n <= c.neg() => Some((Tan, c.clone(), n.add(&c))),
            Csc if positive && n <= c.neg() => Some((Cot, c.clone(), n.add(&c))),
            Sin if c.is_negative() && n >= c.neg() => Some((Cos, c.neg(), n.add(&c))),
            Cos if c.is_negative() && n >= c.neg() => Some((Sin, c.neg(), n.add(&c))),
            Sinh if positive && n >= c => Some((Cosh, c.clone(), n.sub(&c))),
            Cosh if positive && n <= c.neg() => Some((Sinh, c.clone(), n.add(&c))),
            _ => None,
        };
        if let Some((to, coefficient, remaining)) = rewrite {
            let u = u.clone();
            group.rest = square_of(to, u);
            group.coefficient = coefficient;
            group.original = None;
            *constant = Some(remaining);
            return true;
        }
    }
    false
}

struct LikeFactors {
    base: Expr,
    exponents: Vec<Expr>,
    original: Option<Expr>,
}

fn combine_product(operands: Vec<Expr>) -> (Expr, bool) {
    let mut folded = false;
    let mut operands = operands;
    if operands.iter().any(|op| matches!(op, Expr::Complex(_))) {
        (operands, folded) = fold_complex(Operator::Multiply, operands);
    }
    let leading = matches!(operands.first(), Some(Expr::Number(_)));
    let (numerals, factors): (Vec<Expr>, Vec<Expr>) = operands
        .into_iter()
        .partition(|op| matches!(op, Expr::Number(_)));
    let mut changed = folded || numerals.len() > 1 || (numerals.len() == 1 && !leading);
    let mut coefficient = Numeral::one();
    for n in numerals.iter().filter_map(Expr::as_number) {
        coefficient = coefficient.mul(n);
    }
    if coefficient.is_nan() {
        return (Expr::nan(), true);
    }

    let mut groups: Vec<LikeFactors> = Vec::new();
    for factor in factors {
        let original = factor.clone();
        let (base, exponent) = split_power(factor);
        match groups.iter_mut().find(|g| g.base == base) {
            Some(group) => {
                group.exponents.push(exponent);
                group.original = None;
                changed = true;
            }
            None => groups.push(LikeFactors {
                base,
                exponents: vec![exponent],
                original: Some(original),
            }),
        }
    }

    let mut out: Vec<Expr> = Vec::with_capacity(groups.len() + 1);
    for group in groups {
        if let Some(factor) = group.original {
            out.push(factor);
            continue;
        }
        let exponent = add_exponents(group.exponents);
        if exponent.is_zero() {
            continue;
        }
        if exponent.is_one() {
            out.push(group.base);
        } else {
            out.push(pow(group.base, exponent));
        }
    }
    changed |= reciprocal_identity(&mut out);

    if coefficient.is_zero() {
        return (zero(), true);
    }
    if !coefficient.is_one() {
        out.insert(0, Expr::Number(coefficient));
    } else if !numerals.is_empty() {
        changed = true;
    }
    (product(out), changed)
}

fn add_exponents(exponents: Vec<Expr>) -> Expr {
    let numeric: Option<Vec<Numeral>> = exponents.iter().map(as_rational).collect();
    match numeric {
        Some(values) => {
            let total = values
                .iter()
                .fold(Numeral::zero(), |acc, value| acc.add(value));
            rational_expr(&total)
        }
        None => sum(exponents),
    }
}

fn reciprocal_identity(factors: &mut Vec<Expr>) -> bool {
    for i in 0..factors.len() {
        for j in 0..factors.len() {
            if i == j {
                continue;
            }
            let (Some(a), Some(b)) = (factors[i].as_call(), factors[j].as_call()) else {
                continue;
            };
            if a.args.len() != 1 || a.args != b.args {
                continue;
            }
            let Some(result) = product_identity(&a.function, &b.function) else {
                continue;
            };
            let arg = a.args[0].clone();
            let (hi, lo) = if i > j { (i, j) } else { (j, i) };
            factors.remove(hi);
            factors.remove(lo);
            if let Some(function) = result {
                factors.insert(lo, Expr::unary(function, arg));
            }
            return true;
        }
    }
    false
}

fn product_identity(f: &Function, g: &Function) -> Option<Option<Function>> {
    use Function::*;
    let result = match (f, g) {
        (Sin, Csc) | (Cos, Sec) | (Tan, Cot) => None,
        (Sinh, Csch) | (Cosh, Sech) | (Tanh, Coth) => None,
        (Tan, Cos) => Some(Sin),
        (Cot, Sin) => Some(Cos),
        (Sin, Sec) => Some(Tan),
        (Cos, Csc) => Some(Cot),
        (Sec, Cot) => Some(Csc),
        (Csc, Tan) => Some(Sec),
        (Tanh, Cosh) => Some(Sinh),
        (Coth, Sinh) => Some(Cosh),
        (Sinh, Sech) => Some(Tanh),
        (Cosh, Csch) => Some(Coth),
        (Sech, Coth) => Some(Csch),
        (Csch, Tanh) => Some(Sech),
        _ => return None,
    };
    Some(result)
}

fn combine_power(operands: Vec<Expr>) -> (Expr, bool) {
    let [base, exponent] = match <[Expr; 2]>::try_from(operands) {
        Ok(pair) => pair,
        Err(operands) => return (Expr::node(Operator::Raise, operands), false),
    };
    let unchanged = |base: Expr, exponent: Expr| (pow(base, exponent), false);

    if let (Expr::Complex(c), Some(n)) = (&base, exponent.as_number().and_then(Numeral::to_i64)) {
        return match c.powi(n) {
            Some(value) => (complex_expr(value), true),
            None => unchanged(base, exponent),
        };
    }

    if let (Expr::Number(b), Some(e)) = (&base, numeral_value(&exponent)) {
        if !b.is_exact() || !e.is_exact() {
            return (Expr::Number(b.pow(&e)), true);
        }
        if e.is_integer() && e.is_negative() {
            return match b.pow_exact(&e.neg()) {
                Some(v) => (div(one(), Expr::Number(v)), true),
                None => unchanged(base, exponent),
            };
        }
        return match b.pow_exact(&e) {
            Some(v) => (Expr::Number(v), true),
            None => unchanged(base, exponent),
        };
    }

    let integer_exponent = exponent.as_number().and_then(Numeral::to_integer);
    if let Some(n) = integer_exponent.as_ref().filter(|n| n.is_negative()) {
        let magnitude = Expr::integer(n.abs());
        let denominator = if magnitude.is_one() {
            base
        } else {
            pow(base, magnitude)
        };
        return (div(one(), denominator), true);
    }
    let Some(n) = integer_exponent else {
        return match (&base, exponent.as_unary(&Function::Ln)) {
            (Expr::Identifier(name), Some(arg)) if name == "e" => (arg.clone(), true),
            _ => unchanged(base, exponent),
        };
    };

    match base {
        Expr::Node(Node {
            operator: Operator::Raise,
            operands,
        }) => {
            let (inner, a) = split_power(Expr::node(Operator::Raise, operands));
            let scaled = match as_rational(&a) {
                Some(value) => rational_expr(&value.mul(&Numeral::integer(n))),
                None => product(vec![exponent, a]),
            };
            (pow(inner, scaled), true)
        }
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) if n.is_positive() => {
            let factors = operands
                .into_iter()
                .map(|f| pow(f, exponent.clone()))
                .collect();
            (product(factors), true)
        }
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) if n.is_positive() => match <[Expr; 2]>::try_from(operands) {
            Ok([numerator, denominator]) => (
                div(pow(numerator, exponent.clone()), pow(denominator, exponent)),
                true,
            ),
            Err(operands) => unchanged(Expr::node(Operator::Divide, operands), exponent),
        },
        other => unchanged(other, exponent),
    }
}

fn combine_difference(operands: Vec<Expr>) -> (Expr, bool) {
    match operands.as_slice() {
        [Expr::Number(a), Expr::Number(b)] => (Expr::Number(a.sub(b)), true),
        [Expr::Complex(_), _] | [_, Expr::Complex(_)]
            if operands.iter().all(|op| matches!(op, Expr::Number(_) | Expr::Complex(_))) =>
        {
            let value = |op: &Expr| match op {
                Expr::Complex(c) => c.clone(),
                Expr::Number(n) => ComplexNumeral::from_real(n.clone()),
                _ => ComplexNumeral::from_real(Numeral::NaN),
            };
            let total = value(&operands[0]).sub(&value(&operands[1]));
            if total.is_real() {
                (Expr::Number(total.re), true)
            } else {
                (Expr::Complex(total), true)
            }
        }
        _ => (Expr::node(Operator::Subtract, operands), false),
    }
}

fn fold_integers(operator: Operator, operands: Vec<Expr>) -> (Expr, bool) {
    let values: Option<Vec<BigInt>> = operands
        .iter()
        .map(|op| op.as_number().and_then(Numeral::to_integer))
        .collect();
    let Some(values) = values.filter(|v| v.len() >= 2) else {
        return (Expr::node(operator, operands), false);
    };
    let folded = match operator {
        Operator::BitAnd => values.iter().skip(1).fold(values[0].clone(), |a, b| a & b),
        Operator::BitOr => values.iter().skip(1).fold(values[0].clone(), |a, b| a | b),
        Operator::BitXor => values.iter().skip(1).fold(values[0].clone(), |a, b| a ^ b),
        Operator::Modulus if !values[1].is_zero() => &values[0] % &values[1],
        Operator::LeftShift => match values[1].to_usize() {
            Some(shift) if shift <= 4096 => &values[0] << shift,
            _ => return (Expr::node(operator, operands), false),
        },
        Operator::RightShift => match values[1].to_usize() {
            Some(shift) => &values[0] >> shift,
            None => return (Expr::node(operator, operands), false),
        },
        _ => return (Expr::node(operator, operands), false),
    };
    (Expr::integer(folded), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn combined(input: &str) -> String {
        combine(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn folds_numerals_and_like_terms() {
        assert_eq!(combined("1 + 2 + 3"), "6");
        assert_eq!(combined("y + y + 5"), "2y + 5");
        assert_eq!(combined("2 * 3 * x"), "6x");
    }

    #[test]
    fn quotients_carry_their_numeral_factors() {
        let (c, rest) = split_coefficient(parse_expr("(2x) / (3y)").expect("parse input"));
        assert_eq!(c, Numeral::rational(2, 3));
        assert_eq!(rest.to_string(), "x / y");
        let negated = parse_expr("x / (y + 1)").expect("parse input").negate();
        let (c, rest) = split_coefficient(negated);
        assert_eq!(c, Numeral::integer(-1));
        assert_eq!(rest.to_string(), "x / (y + 1)");
    }

    #[test]
    fn adds_exponents_of_equal_bases() {
        assert_eq!(combined("x^2 * x^3"), "x^5");
        assert_eq!(combined("x * x"), "x^2");
        assert_eq!(combined("x^a * x^b"), "x^(a + b)");
    }

    #[test]
    fn powers_of_numerals() {
        assert_eq!(combined("2^10"), "1024");
        assert_eq!(combined("2^(-2)"), "1 / 4");
        assert_eq!(combined("4^0.5"), "2");
    }

    #[test]
    fn pythagorean_identity() {
        assert_eq!(combined("sin(x)^2 + cos(x)^2"), "1");
        assert_eq!(combined("1 - sin(x)^2"), "1 - sin(x)^2");
        assert_eq!(combined("tan(x)^2 + 1"), "sec(x)^2");
    }

    #[test]
    fn reciprocal_calls_cancel() {
        assert_eq!(combined("sin(x) * csc(x)"), "1");
        assert_eq!(combined("tan(x) * cos(x)"), "sin(x)");
    }

    #[test]
    fn integer_bit_operations() {
        assert_eq!(combined("6 & 3"), "2");
        assert_eq!(combined("1 << 4"), "16");
        assert_eq!(combined("7 % 4"), "3");
    }
}
