//! Error types for valuation.

use fairvalue_data::DataError;
use thiserror::Error;

/// Result type for valuation operations.
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Valuation errors.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Parameter outside the domain of the model
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The history could not be prepared for valuation
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}
