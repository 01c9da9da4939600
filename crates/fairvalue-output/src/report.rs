//! Valuation result assembly.

use chrono::NaiveDate;
use fairvalue_data::EntityMetadata;
use fairvalue_valuation::DcfValuation;
use serde::{Deserialize, Serialize};

/// Exchange reported when the entity has no known listing.
pub const NO_EXCHANGE: &str = "NONE";

/// Flat, read-only result of one valuation call.
///
/// Field names and order are the exported record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Ticker symbol the valuation was requested for
    pub ticker_id: String,
    /// Listing exchange, or `"NONE"`
    pub exchange: String,
    /// Regulatory filer identifier, when known
    pub cik: Option<String>,
    /// Registered company name, when known
    pub entity_name: Option<String>,
    /// Most recent fiscal year end used
    pub last_filing_date: NaiveDate,
    /// Days between the last fiscal year end and the forecast date
    pub days_since_filing: i64,
    /// Number of fiscal periods available at the forecast date
    pub count_filings: usize,
    /// Date the valuation is made as of
    pub forecast_date: NaiveDate,
    /// Number of projected years
    pub forecast_horizon: u32,
    /// Most recent share count
    pub shares_outstanding: u64,
    /// Discounted value of the company
    pub company_value: f64,
    /// Company value per share
    pub intrinsic_value: f64,
    /// Whether the last filing is older than the staleness threshold
    pub is_potentially_delisted: bool,
}

/// Build a [`ValuationResult`] from engine output and optional filing metadata.
///
/// Pure mapping. Without metadata `cik` and `entity_name` are `None` and the
/// exchange is [`NO_EXCHANGE`].
pub fn assemble(
    ticker_id: &str,
    metadata: Option<&EntityMetadata>,
    valuation: &DcfValuation,
) -> ValuationResult {
    ValuationResult {
        ticker_id: ticker_id.to_string(),
        exchange: metadata
            .and_then(|m| m.exchange.clone())
            .unwrap_or_else(|| NO_EXCHANGE.to_string()),
        cik: metadata.map(|m| m.entity_id.clone()),
        entity_name: metadata.map(|m| m.entity_name.clone()),
        last_filing_date: valuation.last_filing_date,
        days_since_filing: valuation.days_since_filing,
        count_filings: valuation.count_filings,
        forecast_date: valuation.forecast_date,
        forecast_horizon: valuation.forecast_horizon,
        shares_outstanding: valuation.shares_outstanding,
        company_value: valuation.company_value,
        intrinsic_value: valuation.intrinsic_value,
        is_potentially_delisted: valuation.is_potentially_delisted,
    }
}
