//! The `Stock` aggregate: one entity's history, ready to be valued.

use crate::config::FairValueConfig;
use crate::error::{Error, Result};
use crate::pipeline::{FilingOutcome, evaluate_filings};
use chrono::NaiveDate;
use fairvalue_data::{
    CompanyFacts, DataError, Degradation, EntityMetadata, HistoricalFinancials,
    NormalizedFinancials, Submissions,
};
use fairvalue_output::{ValuationResult, assemble};
use fairvalue_valuation::{
    DcfEngine, DcfParameters, DcfValuation, HistoricalFeatures, ValuationConfig,
};
use tracing::debug;

/// A company to value.
///
/// Built once per valuation request, either from filings or from caller
/// supplied figures. Holds no state between valuations.
#[derive(Debug, Clone)]
pub struct Stock {
    ticker_id: String,
    metadata: Option<EntityMetadata>,
    history: HistoricalFinancials,
    degradations: Vec<Degradation>,
    latest_shares_outstanding: Option<i64>,
    valuation_config: ValuationConfig,
}

impl Stock {
    /// Build a stock from parallel arrays of fiscal year ends, free cash flows
    /// and share counts.
    ///
    /// Dates must be strictly increasing. Mismatched lengths, unordered or
    /// duplicate dates and non-positive share counts are rejected.
    pub fn from_direct_input(
        ticker_id: impl Into<String>,
        year_end_dates: Vec<NaiveDate>,
        free_cash_flows: Vec<f64>,
        shares_outstanding: Vec<i64>,
    ) -> Result<Self> {
        let history =
            HistoricalFinancials::new(year_end_dates, free_cash_flows, shares_outstanding)?;
        Self::from_history(ticker_id, history)
    }

    /// Build a stock from an already validated history.
    pub fn from_history(
        ticker_id: impl Into<String>,
        history: HistoricalFinancials,
    ) -> Result<Self> {
        let ticker_id = ticker_id.into();
        if ticker_id.trim().is_empty() {
            return Err(Error::MissingInput("ticker_id".to_string()));
        }

        Ok(Self {
            ticker_id,
            metadata: None,
            history,
            degradations: Vec::new(),
            latest_shares_outstanding: None,
            valuation_config: ValuationConfig::default(),
        })
    }

    /// Build a stock from SEC company facts and submissions.
    ///
    /// Strict variant of [`evaluate_filings`]: an excluded entity is returned
    /// as [`DataError::ExcludedEntity`].
    pub fn from_filings(
        facts: &CompanyFacts,
        submissions: &Submissions,
        config: &FairValueConfig,
    ) -> Result<Self> {
        match evaluate_filings(facts, submissions, config)? {
            FilingOutcome::Eligible(stock) => Ok(*stock),
            FilingOutcome::Excluded { entity_id, reason } => Err(DataError::ExcludedEntity {
                entity: entity_id,
                reason,
            }
            .into()),
        }
    }

    pub(crate) fn from_normalized(
        ticker_id: String,
        metadata: EntityMetadata,
        normalized: NormalizedFinancials,
        valuation_config: ValuationConfig,
    ) -> Self {
        Self {
            ticker_id,
            metadata: Some(metadata),
            history: normalized.financials,
            degradations: normalized.degradations,
            latest_shares_outstanding: None,
            valuation_config,
        }
    }

    /// Attach filing metadata.
    pub fn with_metadata(mut self, metadata: EntityMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Override the share count used for the per-share value.
    ///
    /// The value is checked when valuing: zero or less fails with a
    /// parameter error.
    pub const fn with_latest_shares_outstanding(mut self, shares: i64) -> Self {
        self.latest_shares_outstanding = Some(shares);
        self
    }

    /// Use a specific engine configuration.
    pub fn with_valuation_config(mut self, config: ValuationConfig) -> Self {
        self.valuation_config = config;
        self
    }

    /// Ticker symbol.
    pub fn ticker_id(&self) -> &str {
        &self.ticker_id
    }

    /// Filing metadata, when built from filings or attached.
    pub const fn metadata(&self) -> Option<&EntityMetadata> {
        self.metadata.as_ref()
    }

    /// Historical financials.
    pub const fn history(&self) -> &HistoricalFinancials {
        &self.history
    }

    /// Number of fiscal periods in the history.
    pub fn count_filings(&self) -> usize {
        self.history.len()
    }

    /// Data-quality issues patched over while normalizing filings.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// Free cash flow statistics, when the history is long enough.
    pub fn historical_features(&self) -> Option<HistoricalFeatures> {
        HistoricalFeatures::from_history(&self.history)
    }

    /// Full engine output, including per-year projections.
    pub fn valuation(&self, parameters: &DcfParameters, as_of: NaiveDate) -> Result<DcfValuation> {
        let engine = DcfEngine::new(self.valuation_config.clone());
        Ok(engine.predict_fairvalue_with_shares(
            &self.history,
            parameters,
            as_of,
            self.latest_shares_outstanding,
        )?)
    }

    /// Estimate the intrinsic value as of `as_of`.
    ///
    /// # Errors
    ///
    /// - parameter error when `discounting_rate <= growth_rate`, the horizon
    ///   is zero or above [`fairvalue_valuation::MAX_FORECAST_YEARS`], the
    ///   share override is not positive or the value overflows
    /// - [`DataError::NoPeriodBefore`] when no fiscal year ended by `as_of`
    pub fn predict_fairvalue(
        &self,
        parameters: &DcfParameters,
        as_of: NaiveDate,
    ) -> Result<ValuationResult> {
        let valuation = self.valuation(parameters, as_of)?;
        debug!(
            ticker = %self.ticker_id,
            intrinsic_value = valuation.intrinsic_value,
            "valued stock"
        );
        Ok(assemble(&self.ticker_id, self.metadata.as_ref(), &valuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stock() -> Stock {
        Stock::from_direct_input(
            "TEST",
            vec![date(2022, 12, 31), date(2023, 12, 31)],
            vec![100.0, 120.0],
            vec![10, 10],
        )
        .unwrap()
    }

    #[test]
    fn test_direct_input() {
        let stock = stock();

        assert_eq!(stock.count_filings(), 2);
        assert_eq!(stock.history().latest().year_end_date, date(2023, 12, 31));
        assert_eq!(stock.history().latest().free_cash_flow, 120.0);
        assert!(stock.metadata().is_none());
        assert!(stock.degradations().is_empty());
    }

    #[test]
    fn test_blank_ticker_rejected() {
        let err = Stock::from_direct_input(" ", vec![date(2023, 12, 31)], vec![1.0], vec![1])
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_unordered_dates_rejected() {
        let err = Stock::from_direct_input(
            "TEST",
            vec![date(2023, 12, 31), date(2022, 12, 31)],
            vec![120.0, 100.0],
            vec![10, 10],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Data(DataError::NonMonotonicDates { .. })));
    }

    #[test]
    fn test_structural_errors_surface_as_data_errors() {
        let err =
            Stock::from_direct_input("TEST", vec![date(2023, 12, 31)], vec![1.0, 2.0], vec![1])
                .unwrap_err();
        assert!(matches!(err, Error::Data(DataError::LengthMismatch { .. })));
    }

    #[test]
    fn test_share_override() {
        let params = DcfParameters::new(0.0, 5, 0.1);
        let base = stock().predict_fairvalue(&params, date(2024, 3, 1)).unwrap();
        let doubled = stock()
            .with_latest_shares_outstanding(20)
            .predict_fairvalue(&params, date(2024, 3, 1))
            .unwrap();

        assert_eq!(doubled.shares_outstanding, 20);
        assert_relative_eq!(doubled.company_value, base.company_value);
        assert_relative_eq!(doubled.intrinsic_value * 2.0, base.intrinsic_value);
    }

    #[test]
    fn test_metadata_flows_into_result() {
        let metadata = EntityMetadata::new("42", "Test Corp").with_listing("TEST", "NYSE");
        let result = stock()
            .with_metadata(metadata)
            .predict_fairvalue(&DcfParameters::default(), date(2024, 3, 1))
            .unwrap();

        assert_eq!(result.exchange, "NYSE");
        assert_eq!(result.cik.as_deref(), Some("42"));
        assert_eq!(result.count_filings, 2);
    }

    #[test]
    fn test_valuation_config_is_used() {
        let config = ValuationConfig {
            staleness_threshold_days: 30,
            ..Default::default()
        };
        let result = stock()
            .with_valuation_config(config)
            .predict_fairvalue(&DcfParameters::default(), date(2024, 3, 1))
            .unwrap();

        assert_eq!(result.days_since_filing, 61);
        assert!(result.is_potentially_delisted);
    }

    #[test]
    fn test_features_need_four_years() {
        assert!(stock().historical_features().is_none());
    }
}
