//! Error types for the fairvalue pipeline.

use fairvalue_data::DataError;
use fairvalue_output::ExportError;
use fairvalue_valuation::ValuationError;
use thiserror::Error;

/// Result type alias using the fairvalue Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from any stage of a valuation.
#[derive(Debug, Error)]
pub enum Error {
    /// Filing parsing, validation or normalization error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Valuation parameter or engine error
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A required input was not supplied
    #[error("missing input: {0}")]
    MissingInput(String),
}

impl Error {
    /// Whether the error comes from invalid valuation parameters, including
    /// a non-positive share count override.
    pub const fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::Valuation(ValuationError::InvalidParameter(_)))
    }
}
