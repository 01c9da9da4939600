#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairvalue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stock;

// Re-export main types from sub-crates
pub use fairvalue_data as data;
pub use fairvalue_output as output;
pub use fairvalue_valuation as valuation;

pub use config::FairValueConfig;
pub use error::{Error, Result};
pub use fairvalue_data::{
    CompanyFacts, Degradation, EntityMetadata, ExclusionReason, HistoricalFinancials,
    Submissions, parse_year_end_dates,
};
pub use fairvalue_output::{ExportFormat, Exporter, ValuationResult};
pub use fairvalue_valuation::{
    DcfEngine, DcfParameters, DcfValuation, ForecastInputs, ForecastValuation, HistoricalFeatures,
    MAX_FORECAST_YEARS, ValuationConfig,
};
pub use pipeline::{FilingOutcome, evaluate_filings};
pub use stock::Stock;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
