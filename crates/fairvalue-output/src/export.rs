//! Flat CSV and JSON export of valuation results.

use crate::report::ValuationResult;
use fairvalue_valuation::ProjectedYear;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn write_csv<'a, T, I>(records: I) -> Result<String, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn export<T: Serialize + ?Sized>(
    value: &T,
    format: ExportFormat,
    csv: impl FnOnce() -> Result<String, ExportError>,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv(),
        ExportFormat::Json => Ok(serde_json::to_string(value)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
    }
}

impl Exporter for ValuationResult {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export(self, format, || write_csv([self]))
    }
}

impl Exporter for Vec<ValuationResult> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export(self, format, || write_csv(self))
    }
}

impl Exporter for Vec<ProjectedYear> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export(self, format, || write_csv(self))
    }
}
