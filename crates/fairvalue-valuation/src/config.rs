//! Valuation configuration and parameters.

use crate::error::{Result, ValuationError};
use serde::{Deserialize, Serialize};

/// Default staleness threshold: one reporting year plus a 90 day grace period.
pub const DEFAULT_STALENESS_THRESHOLD_DAYS: i64 = 365 + 90;

/// Longest forecast horizon accepted, in years.
///
/// Well past the point where discounted flows stop moving the value, and
/// keeps the projection allocation and the integer exponents bounded.
pub const MAX_FORECAST_YEARS: u32 = 200;

/// How projected cash flows are brought back to present value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountConvention {
    /// Each projected flow is first expressed in today's money,
    /// `F_i = F_0 * ((1 + g) / (1 + r))^i`, then discounted by `(1 + r)^i`.
    /// The terminal value grows the deflated final flow.
    #[default]
    Deflated,
    /// `F_i = F_0 * (1 + g)^i`, discounted once by `(1 + r)^i`.
    Nominal,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Days since the last fiscal year end after which an entity is flagged
    /// as potentially delisted (default: 455)
    pub staleness_threshold_days: i64,

    /// Discounting convention (default: deflated)
    pub discount_convention: DiscountConvention,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_days: DEFAULT_STALENESS_THRESHOLD_DAYS,
            discount_convention: DiscountConvention::Deflated,
        }
    }
}

/// Parameters of a single valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfParameters {
    /// Annual free cash flow growth, as a fraction (may be negative)
    pub growth_rate: f64,
    /// Forecast horizon in years
    pub number_of_years: u32,
    /// Annual discount rate, as a fraction; must exceed the growth rate
    pub discounting_rate: f64,
}

impl Default for DcfParameters {
    fn default() -> Self {
        Self {
            growth_rate: 0.0,
            number_of_years: 10,
            discounting_rate: 0.04,
        }
    }
}

impl DcfParameters {
    /// Create parameters.
    pub const fn new(growth_rate: f64, number_of_years: u32, discounting_rate: f64) -> Self {
        Self {
            growth_rate,
            number_of_years,
            discounting_rate,
        }
    }

    /// Check the parameters are inside the model's domain.
    ///
    /// The Gordon growth terminal value diverges unless `discounting_rate >
    /// growth_rate` by a representable margin, and both rates must keep
    /// `1 + rate` positive. The horizon is at most [`MAX_FORECAST_YEARS`].
    pub fn validate(&self) -> Result<()> {
        if !self.growth_rate.is_finite() || !self.discounting_rate.is_finite() {
            return Err(ValuationError::InvalidParameter(format!(
                "rates must be finite, got growth_rate={} discounting_rate={}",
                self.growth_rate, self.discounting_rate
            )));
        }

        if self.growth_rate <= -1.0 || self.discounting_rate <= -1.0 {
            return Err(ValuationError::InvalidParameter(format!(
                "rates must be greater than -1, got growth_rate={} discounting_rate={}",
                self.growth_rate, self.discounting_rate
            )));
        }

        if self.discounting_rate <= self.growth_rate {
            return Err(ValuationError::InvalidParameter(format!(
                "discounting_rate ({}) must be greater than growth_rate ({})",
                self.discounting_rate, self.growth_rate
            )));
        }

        if !(1.0 / (self.discounting_rate - self.growth_rate)).is_finite() {
            return Err(ValuationError::InvalidParameter(format!(
                "discounting_rate ({}) is too close to growth_rate ({})",
                self.discounting_rate, self.growth_rate
            )));
        }

        if self.number_of_years == 0 {
            return Err(ValuationError::InvalidParameter(
                "number_of_years must be positive".to_string(),
            ));
        }

        if self.number_of_years > MAX_FORECAST_YEARS {
            return Err(ValuationError::InvalidParameter(format!(
                "number_of_years must be at most {MAX_FORECAST_YEARS}, got {}",
                self.number_of_years
            )));
        }

        Ok(())
    }
}
