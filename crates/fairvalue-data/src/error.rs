//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::eligibility::ExclusionReason;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while ingesting, validating or normalizing filings.
#[derive(Debug, Error)]
pub enum DataError {
    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A date field could not be parsed
    #[error("Invalid date in field '{field}': {value}")]
    InvalidDate {
        /// Name of the offending field
        field: &'static str,
        /// Raw value that failed to parse
        value: String,
    },

    /// A historical series with no periods
    #[error("Historical financials must contain at least one period")]
    EmptyHistory,

    /// Parallel input arrays of different lengths
    #[error(
        "All fields must have the same length, got year_end_dates={dates}, free_cash_flows={cash_flows}, shares_outstanding={shares}"
    )]
    LengthMismatch {
        /// Number of year-end dates
        dates: usize,
        /// Number of cash-flow values
        cash_flows: usize,
        /// Number of share counts
        shares: usize,
    },

    /// Year-end dates that are not strictly increasing
    #[error("Year-end dates must be strictly increasing: {previous} is followed by {next}")]
    NonMonotonicDates {
        /// Earlier entry in the input
        previous: NaiveDate,
        /// Entry that does not come after it
        next: NaiveDate,
    },

    /// Consecutive year-end dates less than a fiscal year apart
    #[error("Year-end dates {previous} and {next} are less than a fiscal year apart")]
    DuplicateFiscalYear {
        /// Earlier year end
        previous: NaiveDate,
        /// Later year end
        next: NaiveDate,
    },

    /// Zero or negative share count
    #[error("Shares outstanding must be positive for period ending {year_end_date}, got {value}")]
    NonPositiveShares {
        /// Fiscal year end of the offending period
        year_end_date: NaiveDate,
        /// Share count supplied
        value: i64,
    },

    /// Negative capital expenditure in direct input
    #[error(
        "Capital expenditures must be non-negative for period ending {year_end_date}, got {value}"
    )]
    NegativeCapitalExpenditure {
        /// Fiscal year end of the offending period
        year_end_date: NaiveDate,
        /// Value supplied
        value: f64,
    },

    /// NaN or infinite monetary value
    #[error("Field '{field}' must be finite for period ending {year_end_date}")]
    NonFiniteValue {
        /// Name of the offending field
        field: &'static str,
        /// Fiscal year end of the offending period
        year_end_date: NaiveDate,
    },

    /// No usable fiscal-year observation survived normalization
    #[error("Insufficient data for {entity}: {reason}")]
    InsufficientData {
        /// Entity identifier
        entity: String,
        /// Reason for the shortfall
        reason: String,
    },

    /// A required concept is absent for every period
    #[error("Missing concept '{concept}' for every fiscal period")]
    MissingConcept {
        /// Canonical concept name
        concept: String,
    },

    /// Two filings for the same period on the same date with different values
    #[error(
        "Ambiguous filings for '{concept}' period ending {period_end}: filed {filed_date} with values {first} and {second}"
    )]
    AmbiguousFiling {
        /// Canonical concept name
        concept: String,
        /// Period end reported by both filings
        period_end: NaiveDate,
        /// Filing date shared by both filings
        filed_date: NaiveDate,
        /// First conflicting value
        first: f64,
        /// Second conflicting value
        second: f64,
    },

    /// Normalization attempted on an entity the eligibility rules excluded
    #[error("Entity {entity} is excluded: {reason}")]
    ExcludedEntity {
        /// Entity identifier
        entity: String,
        /// Exclusion classification
        reason: ExclusionReason,
    },

    /// Company facts and submissions describe different filers
    #[error("Company facts for CIK {facts} paired with submissions for CIK {submissions}")]
    EntityMismatch {
        /// CIK of the company-facts document
        facts: String,
        /// CIK of the submissions document
        submissions: String,
    },

    /// Truncation date precedes the first fiscal period
    #[error("No fiscal period ends on or before {date}")]
    NoPeriodBefore {
        /// Requested as-of date
        date: NaiveDate,
    },
}
