use flatcas::{
    degree, divide_polynomials, get_ordered_polynomial_coefficients, is_polynomial, max_power,
    parse_expr, shrink, Expr, Numeral,
};

fn parsed(input: &str) -> Expr {
    parse_expr(input).expect("parse input")
}

fn integers(values: &[i64]) -> Vec<Numeral> {
    values.iter().map(|v| Numeral::integer(*v)).collect()
}

#[test]
fn degree_in_named_symbols() {
    assert_eq!(degree(&parsed("x^2 + 3x + 1"), &["x"]), Some(2));
    assert_eq!(degree(&parsed("x^2 + y"), &["y"]), Some(1));
    assert_eq!(degree(&parsed("x * y^2"), &[]), Some(3));
    assert_eq!(degree(&parsed("0"), &[]), Some(-1));
    assert_eq!(degree(&parsed("sin(x)"), &["x"]), None);
}

#[test]
fn polynomial_predicate() {
    assert!(is_polynomial(&parsed("x^2 + 1")));
    assert!(!is_polynomial(&parsed("x^(-1)")));
    assert_eq!(max_power(&parsed("x^3 + x"), "x"), 3);
}

#[test]
fn ordered_coefficients_fill_gaps() {
    assert_eq!(
        get_ordered_polynomial_coefficients(&parsed("2x^2 + 3"), true),
        Some(integers(&[2, 0, 3]))
    );
    assert_eq!(get_ordered_polynomial_coefficients(&parsed("x * y"), false), None);
}

#[test]
fn inexact_coefficients_fail_closed() {
    let half_x = parsed("x / 2 + 1");
    assert_eq!(get_ordered_polynomial_coefficients(&half_x, true), None);
    assert_eq!(
        get_ordered_polynomial_coefficients(&half_x, false),
        Some(vec![Numeral::rational(1, 2), Numeral::integer(1)])
    );
}

#[test]
fn long_division() {
    let (quotient, remainder) =
        divide_polynomials(&parsed("x^2 - 3"), &parsed("x - 1"), &["x"]).expect("division");
    assert_eq!(quotient.to_string(), "x + 1");
    assert_eq!(remainder.to_string(), "-2");
}

#[test]
fn symbolic_coefficients_divide() {
    let (quotient, remainder) =
        divide_polynomials(&parsed("x^2 + a * x"), &parsed("x"), &["x"]).expect("division");
    assert_eq!(quotient, shrink(parsed("x + a")).0);
    assert!(remainder.is_zero());
}

#[test]
fn zero_divisor_is_rejected() {
    assert_eq!(divide_polynomials(&parsed("x + 1"), &parsed("0"), &["x"]), None);
}
