//! Numeric leaves: exact rationals, IEEE floats and the NaN sentinel, plus a small complex type
//! built on top of them.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Pow, Signed, ToPrimitive, Zero};

const MAX_EXACT_EXPONENT: u64 = 4096;

#[derive(Clone, Debug)]
pub enum Numeral {
    Exact(BigRational),
    Float(f64),
    NaN,
}

impl Numeral {
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Numeral::Exact(BigRational::from_integer(value.into()))
    }

    pub fn rational(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Self {
        let den = den.into();
        if den.is_zero() {
            return Numeral::NaN;
        }
        Numeral::Exact(BigRational::new(num.into(), den))
    }

    /// Non-finite values collapse to `NaN` and `-0.0` is stored as `0.0`.
    pub fn float(value: f64) -> Self {
        if !value.is_finite() {
            Numeral::NaN
        } else if value == 0.0 {
            Numeral::Float(0.0)
        } else {
            Numeral::Float(value)
        }
    }

    pub fn zero() -> Self {
        Numeral::integer(0)
    }

    pub fn one() -> Self {
        Numeral::integer(1)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Numeral::NaN)
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Numeral::Exact(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeral::Exact(r) => r.is_zero(),
            Numeral::Float(v) => *v == 0.0,
            Numeral::NaN => false,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Numeral::Exact(r) => r.is_one(),
            Numeral::Float(v) => *v == 1.0,
            Numeral::NaN => false,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Numeral::Exact(r) => r.is_negative(),
            Numeral::Float(v) => *v < 0.0,
            Numeral::NaN => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Numeral::Exact(r) if r.is_integer())
    }

    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Numeral::Exact(r) => Some(r),
            _ => None,
        }
    }

    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Numeral::Exact(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_integer().and_then(|n| n.to_i64())
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeral::Exact(r) => r.to_f64().unwrap_or(f64::NAN),
            Numeral::Float(v) => *v,
            Numeral::NaN => f64::NAN,
        }
    }

    fn combine(
        &self,
        other: &Numeral,
        exact: impl FnOnce(&BigRational, &BigRational) -> BigRational,
        float: impl FnOnce(f64, f64) -> f64,
    ) -> Numeral {
        match (self, other) {
            (Numeral::NaN, _) | (_, Numeral::NaN) => Numeral::NaN,
            (Numeral::Exact(a), Numeral::Exact(b)) => Numeral::Exact(exact(a, b)),
            (a, b) => Numeral::float(float(a.to_f64(), b.to_f64())),
        }
    }

    pub fn add(&self, other: &Numeral) -> Numeral {
        self.combine(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(&self, other: &Numeral) -> Numeral {
        self.combine(other, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Numeral) -> Numeral {
        self.combine(other, |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Numeral) -> Numeral {
        if other.is_zero() {
            return Numeral::NaN;
        }
        self.combine(other, |a, b| a / b, |a, b| a / b)
    }

    pub fn neg(&self) -> Numeral {
        match self {
            Numeral::Exact(r) => Numeral::Exact(-r),
            Numeral::Float(v) => Numeral::float(-v),
            Numeral::NaN => Numeral::NaN,
        }
    }

    pub fn abs(&self) -> Numeral {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    pub fn pow(&self, exponent: &Numeral) -> Numeral {
        match (self, exponent) {
            (Numeral::NaN, _) | (_, Numeral::NaN) => Numeral::NaN,
            (Numeral::Exact(base), Numeral::Exact(exp)) => exact_pow(base, exp)
                .unwrap_or_else(|| Numeral::float(self.to_f64().powf(exponent.to_f64()))),
            _ => Numeral::float(self.to_f64().powf(exponent.to_f64())),
        }
    }

    /// Exact power only: `None` when the result would need a float.
    pub fn pow_exact(&self, exponent: &Numeral) -> Option<Numeral> {
        match (self, exponent) {
            (Numeral::Exact(base), Numeral::Exact(exp)) => exact_pow(base, exp),
            _ => None,
        }
    }

    pub fn sqrt_exact(&self) -> Option<Numeral> {
        self.nth_root_exact(2)
    }

    pub fn nth_root_exact(&self, n: u32) -> Option<Numeral> {
        match self {
            Numeral::Exact(r) => nth_root(r, n).map(Numeral::Exact),
            _ => None,
        }
    }

    /// Greatest common divisor of two exact integers, always non-negative.
    pub fn gcd(&self, other: &Numeral) -> Option<Numeral> {
        let a = self.to_integer()?;
        let b = other.to_integer()?;
        Some(Numeral::integer(a.gcd(&b)))
    }
}

fn exact_pow(base: &BigRational, exp: &BigRational) -> Option<Numeral> {
    if exp.is_integer() {
        let n = exp.to_integer().to_i64()?;
        if n.unsigned_abs() > MAX_EXACT_EXPONENT {
            return None;
        }
        if n < 0 && base.is_zero() {
            return Some(Numeral::NaN);
        }
        let e = n.unsigned_abs() as u32;
        let raised = BigRational::new(Pow::pow(base.numer(), e), Pow::pow(base.denom(), e));
        Some(Numeral::Exact(if n < 0 { raised.recip() } else { raised }))
    } else {
        let q = exp.denom().to_u32()?;
        let root = nth_root(base, q)?;
        exact_pow(&root, &BigRational::from_integer(exp.numer().clone()))
    }
}

fn nth_root(value: &BigRational, n: u32) -> Option<BigRational> {
    if n == 0 || (value.is_negative() && n % 2 == 0) {
        return None;
    }
    let numer = value.numer().nth_root(n);
    let denom = value.denom().nth_root(n);
    if &Pow::pow(&numer, n) == value.numer() && &Pow::pow(&denom, n) == value.denom() {
        Some(BigRational::new(numer, denom))
    } else {
        None
    }
}

impl PartialEq for Numeral {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Numeral {}

impl PartialOrd for Numeral {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Numeral {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Numeral::NaN, Numeral::NaN) => Ordering::Equal,
            (Numeral::NaN, _) => Ordering::Greater,
            (_, Numeral::NaN) => Ordering::Less,
            (Numeral::Exact(a), Numeral::Exact(b)) => a.cmp(b),
            (Numeral::Float(a), Numeral::Float(b)) => a.total_cmp(b),
            (Numeral::Exact(a), Numeral::Float(b)) => a
                .to_f64()
                .unwrap_or(f64::NAN)
                .total_cmp(b)
                .then(Ordering::Less),
            (Numeral::Float(_), Numeral::Exact(_)) => other.cmp(self).reverse(),
        }
    }
}

impl Hash for Numeral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Numeral::Exact(r) => {
                0u8.hash(state);
                r.hash(state);
            }
            Numeral::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            Numeral::NaN => 2u8.hash(state),
        }
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeral::NaN => write!(f, "NaN"),
            Numeral::Float(v) => write!(f, "{v}"),
            Numeral::Exact(r) => match terminating_decimal(r) {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}", r.to_f64().unwrap_or(f64::NAN)),
            },
        }
    }
}

fn terminating_decimal(r: &BigRational) -> Option<String> {
    if r.is_integer() {
        return Some(r.numer().to_string());
    }
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut rest = r.denom().clone();
    let (mut twos, mut fives) = (0usize, 0usize);
    while rest.is_multiple_of(&two) {
        rest /= &two;
        twos += 1;
    }
    while rest.is_multiple_of(&five) {
        rest /= &five;
        fives += 1;
    }
    if !rest.is_one() {
        return None;
    }
    let places = twos.max(fives);
    let scale = Pow::pow(&BigInt::from(10), places as u32);
    let scaled = (r.numer().abs() * scale) / r.denom();
    let mut digits = scaled.to_string();
    while digits.len() <= places {
        digits.insert(0, '0');
    }
    let split = digits.len() - places;
    let (whole, frac) = digits.split_at(split);
    let frac = frac.trim_end_matches('0');
    let sign = if r.is_negative() { "-" } else { "" };
    Some(format!("{sign}{whole}.{frac}"))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComplexNumeral {
    pub re: Numeral,
    pub im: Numeral,
}

impl ComplexNumeral {
    pub fn new(re: Numeral, im: Numeral) -> Self {
        ComplexNumeral { re, im }
    }

    pub fn from_real(re: Numeral) -> Self {
        ComplexNumeral::new(re, Numeral::zero())
    }

    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    pub fn add(&self, other: &ComplexNumeral) -> ComplexNumeral {
        ComplexNumeral::new(self.re.add(&other.re), self.im.add(&other.im))
    }

    pub fn sub(&self, other: &ComplexNumeral) -> ComplexNumeral {
        ComplexNumeral::new(self.re.sub(&other.re), self.im.sub(&other.im))
    }

    pub fn mul(&self, other: &ComplexNumeral) -> ComplexNumeral {
        let re = self.re.mul(&other.re).sub(&self.im.mul(&other.im));
        let im = self.re.mul(&other.im).add(&self.im.mul(&other.re));
        ComplexNumeral::new(re, im)
    }

    pub fn div(&self, other: &ComplexNumeral) -> ComplexNumeral {
        let norm = other.re.mul(&other.re).add(&other.im.mul(&other.im));
        let re = self.re.mul(&other.re).add(&self.im.mul(&other.im));
        let im = self.im.mul(&other.re).sub(&self.re.mul(&other.im));
        ComplexNumeral::new(re.div(&norm), im.div(&norm))
    }

    pub fn neg(&self) -> ComplexNumeral {
        ComplexNumeral::new(self.re.neg(), self.im.neg())
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    /// Integer power by repeated squaring; `None` for huge exponents or a zero base with a
    /// negative exponent.
    pub fn powi(&self, exponent: i64) -> Option<ComplexNumeral> {
        let mut n = exponent.unsigned_abs();
        if n > MAX_EXACT_EXPONENT || (exponent < 0 && self.is_zero()) {
            return None;
        }
        let one = ComplexNumeral::from_real(Numeral::one());
        let mut result = one.clone();
        let mut base = self.clone();
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&base);
            }
            base = base.mul(&base);
            n >>= 1;
        }
        Some(if exponent < 0 { one.div(&result) } else { result })
    }
}

impl fmt::Display for ComplexNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.im.abs();
        let unit = if magnitude.is_one() {
            "i".to_string()
        } else {
            format!("{magnitude}i")
        };
        match (self.re.is_zero(), self.im.is_negative()) {
            (true, true) => write!(f, "-{unit}"),
            (true, false) => f.write_str(&unit),
            (false, true) => write!(f, "{} - {unit}", self.re),
            (false, false) => write!(f, "{} + {unit}", self.re),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_display() {
        assert_eq!(Numeral::rational(1, 2).to_string(), "0.5");
        assert_eq!(Numeral::rational(-3, 4).to_string(), "-0.75");
        assert_eq!(Numeral::rational(1, 20).to_string(), "0.05");
        assert_eq!(Numeral::integer(-7).to_string(), "-7");
        assert_eq!(Numeral::NaN.to_string(), "NaN");
    }

    #[test]
    fn exact_roots_and_powers() {
        let eight = Numeral::integer(8);
        assert_eq!(eight.pow(&Numeral::rational(1, 3)), Numeral::integer(2));
        assert_eq!(Numeral::integer(2).pow(&Numeral::integer(-3)), Numeral::rational(1, 8));
        assert_eq!(Numeral::integer(-4).sqrt_exact(), None);
        assert!(Numeral::zero().pow(&Numeral::integer(-1)).is_nan());
    }

    #[test]
    fn exact_sorts_before_equal_float() {
        let exact = Numeral::integer(1);
        let float = Numeral::float(1.0);
        assert!(exact < float);
        assert_ne!(exact, float);
        assert!(Numeral::float(1e300) < Numeral::NaN);
    }

    #[test]
    fn complex_arithmetic() {
        let i = ComplexNumeral::new(Numeral::zero(), Numeral::one());
        assert_eq!(i.mul(&i), ComplexNumeral::from_real(Numeral::integer(-1)));
        assert_eq!(i.powi(4), Some(ComplexNumeral::from_real(Numeral::one())));
        let z = ComplexNumeral::new(Numeral::integer(3), Numeral::integer(-1));
        assert_eq!(
            ComplexNumeral::from_real(Numeral::one()).div(&z).to_string(),
            "0.3 + 0.1i"
        );
        assert_eq!(z.to_string(), "3 - i");
        assert_eq!(ComplexNumeral::new(Numeral::zero(), Numeral::integer(-2)).to_string(), "-2i");
    }

    #[test]
    fn division_by_zero_is_nan() {
        assert!(Numeral::integer(3).div(&Numeral::zero()).is_nan());
    }
}
