#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairvalue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod dcf;
pub mod error;
pub mod features;
pub mod forecast;

// Re-export main types
pub use config::{DcfParameters, DiscountConvention, MAX_FORECAST_YEARS, ValuationConfig};
pub use dcf::{DcfEngine, DcfValuation, ProjectedYear};
pub use error::{Result, ValuationError};
pub use features::HistoricalFeatures;
pub use forecast::{ForecastInputs, ForecastValuation};
