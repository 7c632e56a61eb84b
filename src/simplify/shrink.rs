use tracing::{debug, trace, warn};

use super::{
    cancel, combine, convert_add_to_subtract, convert_subtract_to_add, distribute_single, expand,
    merge, simplify_calls, snip, sort, Pass,
};
use crate::config::ShrinkOptions;
use crate::expr::Expr;
use crate::factor::cancel_common_factors;

const PIPELINE: [(&str, Pass); 11] = [
    ("convert", convert_subtract_to_add),
    ("merge", merge),
    ("calls", simplify_calls),
    ("expand", expand),
    ("distribute", distribute_single),
    ("combine", combine),
    ("snip", snip),
    ("merge", merge),
    ("sort", sort),
    ("cancel", cancel),
    ("factor", cancel_common_factors),
];

/// Normalizes a tree with the default iteration cap.
pub fn shrink(expr: Expr) -> (Expr, bool) {
    shrink_with(expr, &ShrinkOptions::default())
}

/// Runs the rewrite pipeline until a whole round leaves the tree unchanged.
///
/// Subtractions are turned into sums of negated terms before the first round and restored
/// after the last, so every pass only ever sees flat sums.
pub fn shrink_with(expr: Expr, options: &ShrinkOptions) -> (Expr, bool) {
    let original = expr.clone();
    let cap = options.cap_for(expr.size());
    let (mut current, _) = convert_subtract_to_add(expr);
    let mut rounds = 0;
    let mut settled = false;
    while rounds < cap {
        rounds += 1;
        let next = run_pipeline(current.clone());
        if next == current {
            settled = true;
            break;
        }
        current = next;
    }
    if !settled {
        warn!(
            target: "shrink",
            cap,
            size = current.size(),
            "iteration cap reached before a fixed point; returning the last tree"
        );
    }
    let (result, _) = convert_add_to_subtract(current);
    debug!(target: "shrink", rounds, settled, %result, "shrink finished");
    let changed = result != original;
    (result, changed)
}

fn run_pipeline(expr: Expr) -> Expr {
    let mut current = expr;
    for (name, pass) in PIPELINE {
        let (next, fired) = pass(current);
        if fired {
            trace!(target: "shrink", pass = name, "rewrite fired");
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn shrunk(input: &str) -> String {
        shrink(parse_expr(input).expect("parse input")).0.to_string()
    }

    #[test]
    fn collects_terms_and_numerals() {
        assert_eq!(shrunk("1 + 2 + 3 + y + y + 5"), "2y + 11");
    }

    #[test]
    fn combines_and_cancels_powers() {
        assert_eq!(shrunk("x^2 * x^3"), "x^5");
        assert_eq!(shrunk("x / x^2"), "1 / x");
    }

    #[test]
    fn restores_subtraction() {
        assert_eq!(shrunk("x - 3 - 2"), "x - 5");
        assert_eq!(shrunk("1 - sin(x)^2"), "cos(x)^2");
    }

    #[test]
    fn tiny_cap_still_returns_a_tree() {
        let expr = parse_expr("1 + 2 + 3 + y + y").expect("parse input");
        let (result, _) = shrink_with(expr, &ShrinkOptions::with_max_iterations(1));
        assert_eq!(result.to_string(), "2y + 6");
    }
}
