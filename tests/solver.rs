use flatcas::{has_single_identifier, move_left_and_right, parse_expr, solve, Expr};

fn parsed(input: &str) -> Expr {
    parse_expr(input).expect("parse input")
}

fn solved(symbol: &str, left: &str, right: &str) -> (String, String) {
    let mut left = parsed(left);
    let mut right = parsed(right);
    assert!(solve(symbol, &mut left, &mut right), "solving for {symbol}");
    (left.to_string(), right.to_string())
}

fn pair(left: &str, right: &str) -> (String, String) {
    (left.to_string(), right.to_string())
}

#[test]
fn symbol_factored_out_of_a_sum() {
    assert_eq!(solved("x", "x*y + x*2", "3x"), pair("1", "3 / (y + 2)"));
    assert_eq!(solved("x", "x*y + x*2", "3x * y"), pair("1", "(3y) / (y + 2)"));
}

#[test]
fn constant_addend_moves_across() {
    assert_eq!(solved("x", "x + 2", "y"), pair("x", "y - 2"));
}

#[test]
fn already_isolated() {
    assert_eq!(solved("x", "x", "y"), pair("x", "y"));
    assert_eq!(solved("x", "x", "y + 2"), pair("x", "y + 2"));
}

#[test]
fn missing_symbol_is_a_failure() {
    let mut left = parsed("y");
    let mut right = parsed("2");
    assert!(!solve("x", &mut left, &mut right));
    assert_eq!(left, parsed("y"));
}

#[test]
fn move_left_and_right_splits_terms() {
    let split = |input: &str| {
        let (left, right) = move_left_and_right(&parsed(input), "x");
        (left.to_string(), right.to_string())
    };
    assert_eq!(split("x + 2"), pair("x", "0 - 2"));
    assert_eq!(split("x + y"), pair("x", "0 - y"));
    assert_eq!(split("x - y"), pair("x", "0 - -y"));
    assert_eq!(split("x / y"), pair("x", "1 / (1 / y)"));
}

#[test]
fn single_identifier() {
    assert_eq!(has_single_identifier(&parsed("x^2 + 2x")), Some("x".to_string()));
    assert_eq!(has_single_identifier(&parsed("x + y")), None);
}
