//! Flat n-ary symbolic algebra: canonical normalization of expression trees, differentiation,
//! integration, polynomial division and factoring, equation solving, and 2-D rendering.
//!
//! Every operation takes ownership of (or borrows) a tree and hands back a new one; there is no
//! state between calls.

pub mod calculus;
pub mod config;
pub mod error;
pub mod expr;
pub mod factor;
pub mod format;
pub mod numeral;
pub mod parser;
pub mod polynomial;
pub mod simplify;
pub mod solver;

pub use calculus::{derive, integrate, integrate_with, IntegrationResult, Strategy};
pub use config::{IntegrateOptions, QuadraticTolerance, ShrinkOptions};
pub use error::{CasError, Result};
pub use expr::{compare, equals, Call, Expr, Function, Node, Operator};
pub use factor::{
    factor, factor_difference_of_cubes, factor_difference_of_squares,
    factor_polynomial_by_gcd, factor_polynomial_by_grouping,
    factor_polynomial_by_rational_roots, factor_quadratic, factor_quadratic_whatever,
};
pub use format::{pretty_print, render, CharacterGraph};
pub use numeral::{ComplexNumeral, Numeral};
pub use parser::parse_expr;
pub use polynomial::{
    degree, divide_polynomials, get_ordered_polynomial_coefficients, is_polynomial, max_power,
};
pub use simplify::{shrink, shrink_with};
pub use solver::{has_single_identifier, move_left_and_right, solve};
