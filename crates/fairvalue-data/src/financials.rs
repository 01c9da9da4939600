//! Validated per-fiscal-year financial history.
//!
//! [`HistoricalFinancials`] is what the valuation engine consumes. It is
//! built either by the filing normalizer or directly from caller-supplied
//! parallel arrays; both paths go through the same constructor checks:
//!
//! - at least one period
//! - year-end dates strictly increasing, at least
//!   [`MIN_FISCAL_YEAR_DAYS`] apart
//! - share counts positive
//! - cash flows finite
//!
//! Invalid input is rejected, never reordered or coerced.

use crate::error::{DataError, Result};
use crate::edgar::xbrl::parse_date;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shortest gap between consecutive fiscal year ends, in days.
///
/// Two year ends closer than this describe the same fiscal year (a calendar
/// change or a transition period), which the filing normalizer collapses.
pub const MIN_FISCAL_YEAR_DAYS: i64 = 350;

/// One fiscal-year record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    /// Fiscal year end
    pub year_end_date: NaiveDate,
    /// Operating cash flow less capital expenditures (may be negative)
    pub free_cash_flow: f64,
    /// Common shares outstanding at the year end
    pub shares_outstanding: u64,
}

impl FinancialPeriod {
    /// Creates a period, rejecting non-positive share counts and non-finite cash flows.
    pub fn new(
        year_end_date: NaiveDate,
        free_cash_flow: f64,
        shares_outstanding: i64,
    ) -> Result<Self> {
        if !free_cash_flow.is_finite() {
            return Err(DataError::NonFiniteValue {
                field: "free_cash_flow",
                year_end_date,
            });
        }

        let shares = u64::try_from(shares_outstanding)
            .ok()
            .filter(|&s| s > 0)
            .ok_or(DataError::NonPositiveShares {
                year_end_date,
                value: shares_outstanding,
            })?;

        Ok(Self {
            year_end_date,
            free_cash_flow,
            shares_outstanding: shares,
        })
    }
}

/// Ordered, non-empty sequence of fiscal-year records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FinancialPeriod>", into = "Vec<FinancialPeriod>")]
pub struct HistoricalFinancials {
    periods: Vec<FinancialPeriod>,
}

impl HistoricalFinancials {
    /// Builds a history from parallel arrays.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use fairvalue_data::HistoricalFinancials;
    ///
    /// let history = HistoricalFinancials::new(
    ///     vec![
    ///         NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
    ///         NaiveDate::from_ymd_opt(2024, 9, 28).unwrap(),
    ///     ],
    ///     vec![99_584_000_000.0, 108_807_000_000.0],
    ///     vec![15_550_061_000, 15_116_786_000],
    /// )?;
    /// assert_eq!(history.len(), 2);
    /// assert_eq!(history.latest().shares_outstanding, 15_116_786_000);
    /// # Ok::<(), fairvalue_data::DataError>(())
    /// ```
    pub fn new(
        year_end_dates: Vec<NaiveDate>,
        free_cash_flows: Vec<f64>,
        shares_outstanding: Vec<i64>,
    ) -> Result<Self> {
        if year_end_dates.len() != free_cash_flows.len()
            || year_end_dates.len() != shares_outstanding.len()
        {
            return Err(DataError::LengthMismatch {
                dates: year_end_dates.len(),
                cash_flows: free_cash_flows.len(),
                shares: shares_outstanding.len(),
            });
        }

        let periods = year_end_dates
            .into_iter()
            .zip(free_cash_flows)
            .zip(shares_outstanding)
            .map(|((date, fcf), shares)| FinancialPeriod::new(date, fcf, shares))
            .collect::<Result<Vec<_>>>()?;

        Self::from_periods(periods)
    }

    /// Builds a history from operating cash flows and capital expenditures.
    ///
    /// Free cash flow is `operating - capital_expenditure` per period.
    /// Capital expenditures must be non-negative.
    pub fn from_cash_flows(
        year_end_dates: Vec<NaiveDate>,
        operating_cash_flows: Vec<f64>,
        capital_expenditures: Vec<f64>,
        shares_outstanding: Vec<i64>,
    ) -> Result<Self> {
        if year_end_dates.len() != operating_cash_flows.len()
            || year_end_dates.len() != capital_expenditures.len()
        {
            return Err(DataError::LengthMismatch {
                dates: year_end_dates.len(),
                cash_flows: operating_cash_flows.len().min(capital_expenditures.len()),
                shares: shares_outstanding.len(),
            });
        }

        let mut free_cash_flows = Vec::with_capacity(year_end_dates.len());
        for ((date, operating), capex) in year_end_dates
            .iter()
            .zip(&operating_cash_flows)
            .zip(&capital_expenditures)
        {
            if !capex.is_finite() {
                return Err(DataError::NonFiniteValue {
                    field: "capital_expenditure",
                    year_end_date: *date,
                });
            }
            if *capex < 0.0 {
                return Err(DataError::NegativeCapitalExpenditure {
                    year_end_date: *date,
                    value: *capex,
                });
            }
            free_cash_flows.push(operating - capex);
        }

        Self::new(year_end_dates, free_cash_flows, shares_outstanding)
    }

    /// Builds a history from already constructed periods.
    pub fn from_periods(periods: Vec<FinancialPeriod>) -> Result<Self> {
        if periods.is_empty() {
            return Err(DataError::EmptyHistory);
        }

        if let Some(pair) = periods
            .windows(2)
            .find(|pair| pair[0].year_end_date >= pair[1].year_end_date)
        {
            return Err(DataError::NonMonotonicDates {
                previous: pair[0].year_end_date,
                next: pair[1].year_end_date,
            });
        }

        if let Some(pair) = periods.windows(2).find(|pair| {
            (pair[1].year_end_date - pair[0].year_end_date).num_days() < MIN_FISCAL_YEAR_DAYS
        }) {
            return Err(DataError::DuplicateFiscalYear {
                previous: pair[0].year_end_date,
                next: pair[1].year_end_date,
            });
        }

        Ok(Self { periods })
    }

    /// All periods, oldest first.
    pub fn periods(&self) -> &[FinancialPeriod] {
        &self.periods
    }

    /// Number of fiscal periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Always false; a history holds at least one period.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Most recent period.
    pub fn latest(&self) -> &FinancialPeriod {
        // non-empty by construction
        &self.periods[self.periods.len() - 1]
    }

    /// Year-end dates, oldest first.
    pub fn year_end_dates(&self) -> Vec<NaiveDate> {
        self.periods.iter().map(|p| p.year_end_date).collect()
    }

    /// Free cash flows, oldest first.
    pub fn free_cash_flows(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.free_cash_flow).collect()
    }

    /// Share counts, oldest first.
    pub fn shares_outstanding(&self) -> Vec<u64> {
        self.periods.iter().map(|p| p.shares_outstanding).collect()
    }

    /// Keeps the periods ending on or before `date`.
    pub fn as_of(&self, date: NaiveDate) -> Result<Self> {
        let n = self.periods.partition_point(|p| p.year_end_date <= date);
        if n == 0 {
            return Err(DataError::NoPeriodBefore { date });
        }

        Ok(Self {
            periods: self.periods[..n].to_vec(),
        })
    }

    /// Calendar years between the first and last period with no record.
    pub fn missing_years(&self) -> Vec<i32> {
        let present: BTreeSet<i32> = self.periods.iter().map(|p| p.year_end_date.year()).collect();
        let first = self.periods[0].year_end_date.year();
        let last = self.latest().year_end_date.year();

        (first..=last).filter(|year| !present.contains(year)).collect()
    }
}

impl TryFrom<Vec<FinancialPeriod>> for HistoricalFinancials {
    type Error = DataError;

    fn try_from(periods: Vec<FinancialPeriod>) -> Result<Self> {
        // re-validate each period; deserialized values bypass FinancialPeriod::new
        for period in &periods {
            if !period.free_cash_flow.is_finite() {
                return Err(DataError::NonFiniteValue {
                    field: "free_cash_flow",
                    year_end_date: period.year_end_date,
                });
            }
            if period.shares_outstanding == 0 {
                return Err(DataError::NonPositiveShares {
                    year_end_date: period.year_end_date,
                    value: 0,
                });
            }
        }
        Self::from_periods(periods)
    }
}

impl From<HistoricalFinancials> for Vec<FinancialPeriod> {
    fn from(history: HistoricalFinancials) -> Self {
        history.periods
    }
}

/// Parses `YYYY-MM-DD` year-end dates supplied as text.
pub fn parse_year_end_dates<S: AsRef<str>>(dates: &[S]) -> Result<Vec<NaiveDate>> {
    dates
        .iter()
        .map(|d| parse_date("year_end_dates", d.as_ref()))
        .collect()
}
