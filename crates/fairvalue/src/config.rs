//! Combined configuration.

use crate::error::Result;
use fairvalue_data::{DataError, EligibilityConfig, NormalizerConfig};
use fairvalue_valuation::ValuationConfig;
use serde::{Deserialize, Serialize};

/// Configuration of every pipeline stage.
///
/// Missing sections and fields fall back to their defaults, so a partial
/// JSON document is enough:
///
/// ```
/// use fairvalue::FairValueConfig;
///
/// let config = FairValueConfig::from_json_str(
///     r#"{"valuation": {"staleness_threshold_days": 400}}"#,
/// )?;
/// assert_eq!(config.valuation.staleness_threshold_days, 400);
/// assert_eq!(config.eligibility.blank_check_classifier, 6770);
/// # Ok::<(), fairvalue::Error>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FairValueConfig {
    /// Entity screening rules
    pub eligibility: EligibilityConfig,
    /// Filing normalization rules
    pub normalizer: NormalizerConfig,
    /// DCF engine settings
    pub valuation: ValuationConfig,
}

impl FairValueConfig {
    /// Load a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(DataError::from)?)
    }
}
