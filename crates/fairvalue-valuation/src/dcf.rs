//! Discounted Cash Flow Engine
//!
//! Projects the most recent free cash flow forward, discounts it and adds a
//! Gordon growth terminal value:
//!
//! ```text
//! F_i   = F_0 * k^i                  k = (1+g)/(1+r) deflated, (1+g) nominal
//! PV_i  = F_i / (1+r)^i              i = 1..N
//! TV    = F_N * (1+g) / (r - g)
//! PV_TV = TV / (1+r)^N
//! company_value   = sum(PV_i) + PV_TV
//! intrinsic_value = company_value / shares_outstanding
//! ```
//!
//! Terms are accumulated largest magnitude first so the smallest discounted
//! terms are added last; results are reproducible bit for bit.

use crate::config::{DcfParameters, DiscountConvention, MAX_FORECAST_YEARS, ValuationConfig};
use crate::error::{Result, ValuationError};
use chrono::{Months, NaiveDate};
use fairvalue_data::HistoricalFinancials;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One projected forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    /// Years after the forecast date (1-based)
    pub year: u32,
    /// Anniversary of the forecast date
    pub year_end_date: NaiveDate,
    /// Projected free cash flow
    pub cash_flow: f64,
    /// Discounted value of the projected cash flow
    pub present_value: f64,
}

/// Engine output for one valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    /// Date the valuation is made as of
    pub forecast_date: NaiveDate,
    /// Number of projected years
    pub forecast_horizon: u32,
    /// Most recent fiscal year end known at the forecast date
    pub last_filing_date: NaiveDate,
    /// Days between the last fiscal year end and the forecast date
    pub days_since_filing: i64,
    /// Whether the last filing is older than the staleness threshold
    pub is_potentially_delisted: bool,
    /// Fiscal periods known at the forecast date
    pub count_filings: usize,
    /// Share count used for the per-share value
    pub shares_outstanding: u64,
    /// Free cash flow the projection starts from
    pub base_free_cash_flow: f64,
    /// Projected years, in order
    pub projections: Vec<ProjectedYear>,
    /// Gordon growth terminal value at the horizon
    pub terminal_value: f64,
    /// Terminal value discounted to the forecast date
    pub present_value_terminal: f64,
    /// Sum of all discounted values
    pub company_value: f64,
    /// Company value per share
    pub intrinsic_value: f64,
}

/// DCF valuation engine.
#[derive(Debug, Clone, Default)]
pub struct DcfEngine {
    config: ValuationConfig,
}

impl DcfEngine {
    /// Create an engine with the given configuration.
    pub const fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value a history as of `as_of`.
    ///
    /// Periods ending after `as_of` are ignored. The share count of the most
    /// recent remaining period is used for the per-share value.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use fairvalue_data::HistoricalFinancials;
    /// use fairvalue_valuation::{DcfEngine, DcfParameters};
    ///
    /// let history = HistoricalFinancials::new(
    ///     vec![NaiveDate::from_ymd_opt(2024, 9, 28).unwrap()],
    ///     vec![108_807_000_000.0],
    ///     vec![15_115_823_000],
    /// )?;
    /// let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    ///
    /// let valuation = DcfEngine::default().predict_fairvalue(
    ///     &history,
    ///     &DcfParameters::new(0.02, 10, 0.04),
    ///     as_of,
    /// )?;
    /// assert!((valuation.intrinsic_value - 257.12).abs() < 0.01);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn predict_fairvalue(
        &self,
        history: &HistoricalFinancials,
        parameters: &DcfParameters,
        as_of: NaiveDate,
    ) -> Result<DcfValuation> {
        self.predict_fairvalue_with_shares(history, parameters, as_of, None)
    }

    /// Like [`DcfEngine::predict_fairvalue`], with an explicit share count
    /// overriding the history's most recent one.
    ///
    /// A share count of zero or less is a parameter error.
    pub fn predict_fairvalue_with_shares(
        &self,
        history: &HistoricalFinancials,
        parameters: &DcfParameters,
        as_of: NaiveDate,
        shares_outstanding: Option<i64>,
    ) -> Result<DcfValuation> {
        parameters.validate()?;

        let known = history.as_of(as_of)?;
        let latest = known.latest();

        let shares = match shares_outstanding {
            None => latest.shares_outstanding,
            Some(n) => u64::try_from(n).ok().filter(|&s| s > 0).ok_or_else(|| {
                ValuationError::InvalidParameter(format!(
                    "shares_outstanding must be positive, got {n}"
                ))
            })?,
        };

        let g = parameters.growth_rate;
        let r = parameters.discounting_rate;
        let n = parameters.number_of_years;

        let step = match self.config.discount_convention {
            DiscountConvention::Deflated => (1.0 + g) / (1.0 + r),
            DiscountConvention::Nominal => 1.0 + g,
        };

        let mut rows = Vec::with_capacity(n as usize);
        for year in 1..=n {
            let cash_flow = latest.free_cash_flow * step.powi(exponent(year)?);
            rows.push((anniversary(as_of, year)?, cash_flow, r));
        }

        let Discounted {
            projections,
            terminal_value,
            present_value_terminal,
            company_value,
        } = discount(&rows, g)?;

        let days_since_filing = (as_of - latest.year_end_date).num_days();
        let is_potentially_delisted = days_since_filing > self.config.staleness_threshold_days;

        debug!(
            %as_of,
            company_value,
            shares,
            days_since_filing,
            "computed DCF valuation"
        );

        Ok(DcfValuation {
            forecast_date: as_of,
            forecast_horizon: n,
            last_filing_date: latest.year_end_date,
            days_since_filing,
            is_potentially_delisted,
            count_filings: known.len(),
            shares_outstanding: shares,
            base_free_cash_flow: latest.free_cash_flow,
            projections,
            terminal_value,
            present_value_terminal,
            company_value,
            intrinsic_value: company_value / shares as f64,
        })
    }
}

/// `date` moved forward by whole years; 29 February becomes 28 February in
/// non-leap years.
fn anniversary(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    years
        .checked_mul(12)
        .and_then(|months| date.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            ValuationError::InvalidParameter(format!(
                "forecast year {years} after {date} is out of the supported date range"
            ))
        })
}

/// Discounted projection shared by generated and explicit forecasts.
#[derive(Debug)]
pub(crate) struct Discounted {
    pub(crate) projections: Vec<ProjectedYear>,
    pub(crate) terminal_value: f64,
    pub(crate) present_value_terminal: f64,
    pub(crate) company_value: f64,
}

/// Discount `(year_end_date, cash_flow, rate)` rows, year `i` by
/// `(1 + rate_i)^i`, and add a Gordon growth terminal value on the last row.
///
/// Fails instead of returning a non-finite value.
pub(crate) fn discount(
    rows: &[(NaiveDate, f64, f64)],
    terminal_growth: f64,
) -> Result<Discounted> {
    let Some(&(_, final_cash_flow, final_rate)) = rows.last() else {
        return Err(ValuationError::InvalidParameter(
            "forecast must cover at least one year".to_string(),
        ));
    };

    let mut projections = Vec::with_capacity(rows.len());
    for (index, &(year_end_date, cash_flow, rate)) in rows.iter().enumerate() {
        let year = u32::try_from(index + 1).map_err(|_| horizon_too_long(index + 1))?;
        projections.push(ProjectedYear {
            year,
            year_end_date,
            cash_flow,
            present_value: cash_flow / (1.0 + rate).powi(exponent(year)?),
        });
    }

    let horizon = u32::try_from(rows.len()).map_err(|_| horizon_too_long(rows.len()))?;
    let terminal_value = final_cash_flow * (1.0 + terminal_growth) / (final_rate - terminal_growth);
    let present_value_terminal = terminal_value / (1.0 + final_rate).powi(exponent(horizon)?);

    let mut terms: Vec<f64> = projections.iter().map(|p| p.present_value).collect();
    terms.push(present_value_terminal);
    let company_value = stable_sum(terms);

    if !(terminal_value.is_finite() && company_value.is_finite()) {
        return Err(ValuationError::InvalidParameter(format!(
            "valuation overflows: terminal_value={terminal_value} company_value={company_value}"
        )));
    }

    Ok(Discounted {
        projections,
        terminal_value,
        present_value_terminal,
        company_value,
    })
}

fn exponent(year: u32) -> Result<i32> {
    i32::try_from(year).map_err(|_| horizon_too_long(year as usize))
}

fn horizon_too_long(years: usize) -> ValuationError {
    ValuationError::InvalidParameter(format!(
        "forecast of {years} years exceeds the maximum of {MAX_FORECAST_YEARS}"
    ))
}

/// Sums largest magnitude first, so the smallest terms are added last.
fn stable_sum(mut terms: Vec<f64>) -> f64 {
    terms.sort_by(|a, b| b.abs().total_cmp(&a.abs()));
    terms.into_iter().fold(0.0, |acc, t| acc + t)
}
