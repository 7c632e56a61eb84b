//! End-to-end behaviour of the public entry points on their reference inputs.

use flatcas::{
    derive, factor_difference_of_squares, factor_polynomial_by_gcd, integrate, parse_expr,
    shrink, solve, Expr, IntegrationResult,
};

fn parsed(input: &str) -> Expr {
    parse_expr(input).expect("parse input")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn shrink_collects_constants_and_terms() {
    init_tracing();
    assert_eq!(shrink(parsed("1 + 2 + 3 + y + y + 5")).0.to_string(), "2y + 11");
}

#[test]
fn shrink_combines_powers() {
    assert_eq!(shrink(parsed("x^2 * x^3")).0.to_string(), "x^5");
    assert_eq!(shrink(parsed("x / x^2")).0.to_string(), "1 / x");
}

#[test]
fn derive_product() {
    let result = derive(&parsed("x^2 * e^x"), "x").expect("derivative");
    assert_eq!(result.to_string(), "2 * x * e^x + x^2 * e^x");
}

#[test]
fn integrate_reciprocal_and_self_power() {
    init_tracing();
    let reciprocal = integrate(&parsed("1 / x"), "x").into_result().expect("antiderivative");
    assert_eq!(reciprocal.to_string(), "ln(abs(x))");
    assert_eq!(integrate(&parsed("x^x"), "x"), IntegrationResult::NotFound);
}

#[test]
fn integrate_self_referential_by_parts() {
    init_tracing();
    let result = integrate(&parsed("e^x * sin(x)"), "x")
        .into_result()
        .expect("antiderivative");
    assert_eq!(result.to_string(), "(sin(x) * e^x - cos(x) * e^x) / 2");
}

#[test]
fn factor_content_and_squares() {
    let (gcd, modified) = factor_polynomial_by_gcd(parsed("4x + -2"));
    assert!(modified);
    assert_eq!(gcd.to_string(), "2 * (2x - 1)");
    let (squares, modified) = factor_difference_of_squares(parsed("x^2 - 16"));
    assert!(modified);
    assert_eq!(squares.to_string(), "(x + 4) * (x - 4)");
}

#[test]
fn solve_factors_the_symbol_out() {
    let mut left = parsed("x*y + x*2");
    let mut right = parsed("3x");
    assert!(solve("x", &mut left, &mut right));
    assert_eq!(left.to_string(), "1");
    assert_eq!(right.to_string(), "3 / (y + 2)");
}
