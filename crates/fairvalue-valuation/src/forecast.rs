//! Valuation of an explicit, caller supplied cash flow forecast.
//!
//! Where [`DcfEngine::predict_fairvalue`] grows the last reported free cash
//! flow at one rate, a forecast lists each year's cash flow and discount
//! rate. Year `i` is discounted by `(1 + r_i)^i` and the terminal value grows
//! the final year's flow at the terminal growth rate, discounted at the final
//! year's rate.

use crate::config::MAX_FORECAST_YEARS;
use crate::dcf::{DcfEngine, Discounted, ProjectedYear, discount};
use crate::error::{Result, ValuationError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Year-by-year forecast to value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInputs {
    /// Forecast fiscal year ends, strictly increasing, one per calendar year
    pub year_end_dates: Vec<NaiveDate>,
    /// Forecast free cash flow per year
    pub free_cash_flows: Vec<f64>,
    /// Discount rate per year, as a fraction
    pub discounting_rates: Vec<f64>,
    /// Shares outstanding used for the per-share value
    pub shares_outstanding: i64,
    /// Growth of the final year's flow into perpetuity; must be below the
    /// final discount rate
    pub terminal_growth_rate: f64,
}

impl ForecastInputs {
    /// Check the forecast is well formed and inside the model's domain.
    pub fn validate(&self) -> Result<()> {
        let len = self.year_end_dates.len();
        if len == 0 {
            return Err(invalid("forecast must cover at least one year".to_string()));
        }
        if self.free_cash_flows.len() != len || self.discounting_rates.len() != len {
            return Err(invalid(format!(
                "forecast arrays differ in length: {len} dates, {} cash flows, {} rates",
                self.free_cash_flows.len(),
                self.discounting_rates.len()
            )));
        }
        if len > MAX_FORECAST_YEARS as usize {
            return Err(invalid(format!(
                "forecast of {len} years exceeds the maximum of {MAX_FORECAST_YEARS}"
            )));
        }

        for pair in self.year_end_dates.windows(2) {
            if pair[0] >= pair[1] || pair[0].year() == pair[1].year() {
                return Err(invalid(format!(
                    "forecast years must be strictly increasing and unique, got {} then {}",
                    pair[0], pair[1]
                )));
            }
        }

        if let Some(cash_flow) = self.free_cash_flows.iter().find(|f| !f.is_finite()) {
            return Err(invalid(format!("free cash flows must be finite, got {cash_flow}")));
        }
        if let Some(rate) = self
            .discounting_rates
            .iter()
            .find(|r| !r.is_finite() || **r <= -1.0)
        {
            return Err(invalid(format!(
                "discounting rates must be finite and greater than -1, got {rate}"
            )));
        }

        let g = self.terminal_growth_rate;
        let final_rate = self.discounting_rates[len - 1];
        if !g.is_finite()
            || g <= -1.0
            || final_rate <= g
            || !(1.0 / (final_rate - g)).is_finite()
        {
            return Err(invalid(format!(
                "terminal_growth_rate ({g}) must be finite and below the final \
                 discounting rate ({final_rate})"
            )));
        }

        if self.shares_outstanding <= 0 {
            return Err(invalid(format!(
                "shares_outstanding must be positive, got {}",
                self.shares_outstanding
            )));
        }

        Ok(())
    }
}

/// Engine output for an explicit forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastValuation {
    /// Shares outstanding used for the per-share value
    pub shares_outstanding: u64,
    /// Per-year discounted cash flows
    pub projections: Vec<ProjectedYear>,
    /// Gordon growth terminal value at the end of the forecast
    pub terminal_value: f64,
    /// Terminal value discounted to today
    pub present_value_terminal: f64,
    /// Sum of discounted cash flows and discounted terminal value
    pub company_value: f64,
    /// Company value per share
    pub intrinsic_value: f64,
}

impl DcfEngine {
    /// Value an explicit year-by-year forecast.
    ///
    /// # Errors
    ///
    /// [`ValuationError::InvalidParameter`] when the forecast fails
    /// [`ForecastInputs::validate`] or the value overflows.
    pub fn value_forecast(&self, forecast: &ForecastInputs) -> Result<ForecastValuation> {
        forecast.validate()?;

        let rows: Vec<(NaiveDate, f64, f64)> = forecast
            .year_end_dates
            .iter()
            .zip(&forecast.free_cash_flows)
            .zip(&forecast.discounting_rates)
            .map(|((&date, &cash_flow), &rate)| (date, cash_flow, rate))
            .collect();

        let Discounted {
            projections,
            terminal_value,
            present_value_terminal,
            company_value,
        } = discount(&rows, forecast.terminal_growth_rate)?;

        let shares = u64::try_from(forecast.shares_outstanding).map_err(|_| {
            invalid(format!(
                "shares_outstanding must be positive, got {}",
                forecast.shares_outstanding
            ))
        })?;

        debug!(years = rows.len(), company_value, shares, "valued explicit forecast");

        Ok(ForecastValuation {
            shares_outstanding: shares,
            projections,
            terminal_value,
            present_value_terminal,
            company_value,
            intrinsic_value: company_value / shares as f64,
        })
    }
}

const fn invalid(message: String) -> ValuationError {
    ValuationError::InvalidParameter(message)
}
