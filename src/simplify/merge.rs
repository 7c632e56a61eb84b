use super::bottom_up;
use crate::expr::{Expr, Node, Operator};

/// Splices nested nodes of an associative operator into their parent: `(a + b) + c` becomes
/// `a + b + c`. A node left with one operand is replaced by it.
pub fn merge(expr: Expr) -> (Expr, bool) {
    bottom_up(expr, &mut merge_node)
}

fn merge_node(expr: Expr) -> (Expr, bool) {
    let Expr::Node(Node { operator, operands }) = expr else {
        return (expr, false);
    };
    if !operator.is_associative() {
        return (Expr::node(operator, operands), false);
    }
    let mut changed = false;
    let mut flat = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand {
            Expr::Node(inner) if inner.operator == operator => {
                changed = true;
                flat.extend(inner.operands);
            }
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => (identity(operator), true),
        1 => (flat.remove(0), true),
        _ => (Expr::node(operator, flat), changed),
    }
}

fn identity(operator: Operator) -> Expr {
    match operator {
        Operator::Multiply => Expr::number(1),
        Operator::BitAnd => Expr::number(-1),
        _ => Expr::number(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn splices_nested_sums() {
        let input = parse_expr("(a + b) + (c + d)").expect("parse input");
        let (merged, changed) = merge(input);
        assert!(changed);
        assert_eq!(merged.children().len(), 4);
    }

    #[test]
    fn leaves_subtraction_binary() {
        let input = parse_expr("(a - b) - c").expect("parse input");
        let (merged, changed) = merge(input.clone());
        assert!(!changed);
        assert_eq!(merged, input);
    }
}
