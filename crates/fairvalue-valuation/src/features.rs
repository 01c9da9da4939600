//! Historical free cash flow features.
//!
//! Descriptive statistics reported next to a valuation to judge how stable
//! the cash flow being projected has been:
//!
//! - lag-1 autocorrelation of free cash flow
//! - median year-on-year growth over the whole history
//! - median year-on-year growth over the last four periods
//!
//! Growth between consecutive years is `F_t / (F_{t-1} + 1) - 1`; the shift by
//! one keeps a zero cash flow from dividing by zero.

use fairvalue_data::HistoricalFinancials;
use serde::{Deserialize, Serialize};

/// Minimum number of periods needed to compute features.
pub const MIN_PERIODS: usize = 4;

/// Free cash flow statistics of a history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFeatures {
    /// Pearson correlation of consecutive free cash flows (None when constant)
    pub fcf_autocorrelation: Option<f64>,
    /// Median year-on-year growth over all periods
    pub median_fcf_growth_all: f64,
    /// Median year-on-year growth over the last four periods
    pub median_fcf_growth_l4y: f64,
}

impl HistoricalFeatures {
    /// Compute features, or None when the history has fewer than four
    /// periods or skips a calendar year.
    pub fn from_history(history: &HistoricalFinancials) -> Option<Self> {
        if history.len() < MIN_PERIODS || !history.missing_years().is_empty() {
            return None;
        }

        let fcf = history.free_cash_flows();
        let growth = year_on_year_growth(&fcf);
        let recent = year_on_year_growth(&fcf[fcf.len() - MIN_PERIODS..]);

        Some(Self {
            fcf_autocorrelation: correlation(&fcf[..fcf.len() - 1], &fcf[1..]),
            median_fcf_growth_all: median(growth)?,
            median_fcf_growth_l4y: median(recent)?,
        })
    }
}

fn year_on_year_growth(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / (w[0] + 1.0) - 1.0).collect()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    (denominator > 0.0).then(|| cov / denominator)
}
