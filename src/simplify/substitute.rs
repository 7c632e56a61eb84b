use super::shrunk;
use crate::expr::Expr;

/// Replaces every occurrence of the identifier `var` with `replacement` and shrinks the result.
pub fn substitute(expr: &Expr, var: &str, replacement: &Expr) -> Expr {
    let (replaced, changed) = expr.clone().replace_identifier(var, replacement);
    if changed {
        shrunk(replaced)
    } else {
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn replaces_and_settles() {
        let expr = parse_expr("x^2 + x").expect("parse input");
        let two = Expr::number(2);
        assert_eq!(substitute(&expr, "x", &two).to_string(), "6");
    }

    #[test]
    fn missing_identifier_leaves_the_tree() {
        let expr = parse_expr("y + 1").expect("parse input");
        let result = substitute(&expr, "x", &Expr::number(3));
        assert_eq!(result, expr);
    }
}
