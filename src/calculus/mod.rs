//! Differentiation and integration over flat trees.

pub mod differentiate;
pub mod integrate;

pub use differentiate::derive;
pub use integrate::{
    choose, integrate, integrate_with, is_algebraic, is_exponential, is_inverse_trigonometric,
    is_logarithmic, is_trigonometric, order_for_ilate, substitute, unfindable_substitution,
    IntegrationResult, Strategy, Substitution,
};
