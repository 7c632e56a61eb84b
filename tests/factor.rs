use flatcas::{
    factor, factor_difference_of_cubes, factor_difference_of_squares, factor_polynomial_by_gcd,
    factor_polynomial_by_grouping, factor_polynomial_by_rational_roots, factor_quadratic,
    factor_quadratic_whatever, parse_expr, Expr, QuadraticTolerance,
};

fn run(pass: fn(Expr) -> (Expr, bool), input: &str) -> (String, bool) {
    let (result, modified) = pass(parse_expr(input).expect("parse input"));
    (result.to_string(), modified)
}

fn factored(pass: fn(Expr) -> (Expr, bool), input: &str, expected: &str) {
    let (got, modified) = run(pass, input);
    assert!(modified, "{input} should factor");
    assert_eq!(got, expected, "factoring {input}");
}

#[test]
fn integer_content() {
    factored(factor_polynomial_by_gcd, "4x + -2", "2 * (2x - 1)");
    factored(factor_polynomial_by_gcd, "-4x^2 + 4x + 4", "4 * (-x^2 + x + 1)");
    factored(factor_polynomial_by_gcd, "6 + 3x^2", "3 * (x^2 + 2)");
}

#[test]
fn shared_symbolic_factor() {
    factored(factor, "x + y * x", "x * (1 + y)");
    assert!(!run(factor, "x + y").1);
}

#[test]
fn difference_of_squares() {
    factored(factor_difference_of_squares, "x^2 - 16", "(x + 4) * (x - 4)");
    assert!(!run(factor_difference_of_squares, "x^2 + 16").1);
}

#[test]
fn sum_and_difference_of_cubes() {
    factored(
        factor_difference_of_cubes,
        "27x^3 + 1",
        "(3x + 1) * (9x^2 - 3x + 1)",
    );
    factored(factor_difference_of_cubes, "x^3 - 8", "(x - 2) * (x^2 + 2x + 4)");
}

#[test]
fn quadratics_with_integer_roots() {
    factored(factor_quadratic, "x^2 + 5x + 6", "(x + 2) * (x + 3)");
    factored(factor_quadratic, "9x^2 + 42x + 49", "(3x + 7)^2");
    factored(factor_quadratic, "9x^2 + 36x + 36", "9 * (x + 2)^2");
}

#[test]
fn quadratic_without_real_roots_is_left_alone() {
    let expr = parse_expr("x^2 + 1").expect("parse input");
    let (result, modified) = factor_quadratic_whatever(expr.clone(), QuadraticTolerance::default());
    assert!(!modified);
    assert_eq!(result, expr);
}

#[test]
fn rational_root_splits_a_cubic() {
    factored(
        factor_polynomial_by_rational_roots,
        "x^3 + 2x^2 + 2x + 1",
        "(x + 1) * (x^2 + x + 1)",
    );
}

#[test]
fn grouping_four_terms() {
    factored(
        factor_polynomial_by_grouping,
        "x^3 + 2x^2 - 9x - 18",
        "(x^2 - 9) * (x + 2)",
    );
    factored(
        factor_polynomial_by_grouping,
        "4x^2 + 20x - 3x * y - 15y",
        "(4x - 3y) * (x + 5)",
    );
    factored(
        factor_polynomial_by_grouping,
        "3x^3 - 6x^2 + 15x - 30",
        "3 * (x^2 + 5) * (x - 2)",
    );
}
