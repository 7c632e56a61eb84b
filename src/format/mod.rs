//! Rendering: the canonical linear form and the 2-D character graph.

mod expr;
mod pretty;

pub use expr::render;
pub use pretty::{CharacterGraph, pretty_print};
