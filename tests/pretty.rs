use flatcas::{parse_expr, pretty_print};

fn drawn(input: &str) -> String {
    pretty_print(&parse_expr(input).expect("parse input")).to_string()
}

#[test]
fn single_row_sum() {
    assert_eq!(drawn("x + y"), "x + y");
}

#[test]
fn fraction_rule_is_two_wider() {
    assert_eq!(drawn("(x + 1) / 2"), " x + 1 \n-------\n   2   ");
}

#[test]
fn exponent_above_the_base() {
    assert_eq!(drawn("sin(x)^2"), "      2\nsin(x) ");
}

#[test]
fn exponent_chains_climb() {
    assert_eq!(drawn("2^x^y"), "  y\n x \n2  ");
}
