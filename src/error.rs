use thiserror::Error;

pub type Result<T> = std::result::Result<T, CasError>;

/// Failures that are faults of the request rather than expected non-results.
///
/// "Not integrable", "not a polynomial" and "cannot isolate" are ordinary return values
/// (`IntegrationResult::NotFound`, `None`, `false`) and never appear here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CasError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no derivative rule for `{function}`")]
    UnknownFunction { function: String },
    #[error("cannot differentiate `{expr}` with respect to `{symbol}`")]
    NotDifferentiable { expr: String, symbol: String },
}
