//! Rewrite passes over flat trees and the `shrink` driver that runs them to a fixed point.
//!
//! Every pass consumes a tree and hands back the rewritten tree together with a flag telling
//! whether anything fired.

mod cancel;
mod combine;
mod merge;
mod shrink;
mod snip;
mod sort;
mod structure;
mod substitute;
mod trig;

pub use cancel::{cancel, cancel_top_and_bottom};
pub use combine::combine;
pub use merge::merge;
pub use shrink::{shrink, shrink_with};
pub use snip::snip;
pub use sort::sort;
pub use structure::{
    collect_powers, convert_add_to_subtract, convert_divide_to_multiply,
    convert_multiply_to_divide, convert_subtract_to_add, distribute, distribute_like_a_madman,
    expand, expand_divide, expand_raise, move_number_to_front, multiply_by_denominator,
    order_subtract,
};
pub use substitute::substitute;
pub use trig::{simplify_method_call, simplify_trigonometry};

pub(crate) use cancel::{cancel_counting_bases, factors_of};
pub(crate) use combine::{split_coefficient, split_power, with_coefficient};
pub(crate) use structure::{distribute_single, times};
pub(crate) use trig::simplify_calls;

use crate::expr::{Call, Expr, Node};

/// A single rewrite step: the new tree and whether it differs from the input.
pub type Pass = fn(Expr) -> (Expr, bool);

/// Shorthand for the tree `shrink` settles on when the caller does not need the flag.
pub(crate) fn shrunk(expr: Expr) -> Expr {
    shrink(expr).0
}

/// Applies `rule` to every node, children first.
pub(crate) fn bottom_up<F>(expr: Expr, rule: &mut F) -> (Expr, bool)
where
    F: FnMut(Expr) -> (Expr, bool),
{
    let (expr, below) = match expr {
        Expr::Node(Node { operator, operands }) => {
            let (operands, changed) = each(operands, rule);
            (Expr::node(operator, operands), changed)
        }
        Expr::Call(Call { function, args }) => {
            let (args, changed) = each(args, rule);
            (Expr::call(function, args), changed)
        }
        leaf => (leaf, false),
    };
    let (expr, here) = rule(expr);
    (expr, below || here)
}

fn each<F>(items: Vec<Expr>, rule: &mut F) -> (Vec<Expr>, bool)
where
    F: FnMut(Expr) -> (Expr, bool),
{
    let mut changed = false;
    let items = items
        .into_iter()
        .map(|item| {
            let (item, hit) = bottom_up(item, rule);
            changed |= hit;
            item
        })
        .collect();
    (items, changed)
}
