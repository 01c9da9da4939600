//! Filing normalization.
//!
//! Turns the raw concept series of an eligible entity into a
//! [`HistoricalFinancials`] with one record per fiscal year end.
//!
//! Steps:
//! 1. Resolve each canonical concept through the tag-synonym table. Per period
//!    end the highest-priority tag reporting that period wins.
//! 2. Keep only annual observations: annual form types, and durations of
//!    roughly one year for cash-flow concepts.
//! 3. Deduplicate amended filings: the latest `filed_date` wins. Two different
//!    values filed on the same day are an [`DataError::AmbiguousFiling`].
//! 4. Adjust share counts for later stock splits.
//! 5. Join operating cash flow, capital expenditures and shares on the fiscal
//!    year end and compute free cash flow.
//!
//! Recoverable gaps are reported as [`Degradation`]s rather than errors.

use crate::edgar::concepts::{CanonicalConcept, TagSynonyms};
use crate::edgar::xbrl::{ConceptObservation, ConceptSeries};
use crate::eligibility::Eligibility;
use crate::error::{DataError, Result};
use crate::financials::{FinancialPeriod, HistoricalFinancials, MIN_FISCAL_YEAR_DAYS};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Configuration for the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Form types carrying annual figures (default: 10-K, 20-F, transition and amended variants)
    pub annual_forms: Vec<String>,
    /// Shortest duration accepted as a fiscal year, in days (default: 350)
    pub min_annual_days: i64,
    /// Longest duration accepted as a fiscal year, in days (default: 380)
    pub max_annual_days: i64,
    /// Tag synonyms, highest priority first
    pub synonyms: TagSynonyms,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            annual_forms: ["10-K", "10-K/A", "10-KT", "10-KT/A", "20-F", "20-F/A"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_annual_days: 350,
            max_annual_days: 380,
            synonyms: TagSynonyms::default(),
        }
    }
}

/// A recoverable data-quality issue found while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No capital expenditure reported; treated as zero
    MissingCapitalExpenditure {
        /// Affected fiscal year end
        year_end_date: NaiveDate,
    },
    /// No share count in the same reporting year; period dropped
    MissingShares {
        /// Dropped fiscal year end
        year_end_date: NaiveDate,
    },
    /// Share count rounded to zero; period dropped
    NonPositiveShares {
        /// Dropped fiscal year end
        year_end_date: NaiveDate,
    },
    /// Two fiscal year ends less than a fiscal year apart; the later one is kept
    FiscalYearCollision {
        /// Fiscal year end kept
        kept: NaiveDate,
        /// Fiscal year end dropped
        dropped: NaiveDate,
    },
    /// Pre-split share count filed after the split; observation dropped
    SplitRestatementDropped {
        /// Period end of the dropped share observation
        period_end: NaiveDate,
        /// Filing date of the dropped share observation
        filed_date: NaiveDate,
    },
}

/// Normalizer output: the history plus everything that had to be patched over.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFinancials {
    /// Validated fiscal-year history
    pub financials: HistoricalFinancials,
    /// Recoverable issues, in the order found
    pub degradations: Vec<Degradation>,
}

impl NormalizedFinancials {
    /// Number of fiscal periods that survived normalization.
    pub fn count_filings(&self) -> usize {
        self.financials.len()
    }
}

/// Converts raw concept series into [`HistoricalFinancials`].
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer.
    pub const fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one entity's filings.
    ///
    /// `eligibility` must be the result of the eligibility rules for the same
    /// entity; excluded entities are refused with [`DataError::ExcludedEntity`].
    ///
    /// # Errors
    ///
    /// - [`DataError::InsufficientData`] when no fiscal year survives
    /// - [`DataError::MissingConcept`] when no share count is reported at all
    /// - [`DataError::AmbiguousFiling`] for same-day conflicting amendments
    pub fn normalize(
        &self,
        entity_id: &str,
        series: &ConceptSeries,
        eligibility: &Eligibility,
    ) -> Result<NormalizedFinancials> {
        if let Eligibility::Excluded(reason) = eligibility {
            return Err(DataError::ExcludedEntity {
                entity: entity_id.to_string(),
                reason: *reason,
            });
        }

        let mut degradations = Vec::new();

        let operating = self.resolve(series, CanonicalConcept::OperatingCashFlow, |o| {
            self.is_annual_duration(o)
        })?;
        if operating.is_empty() {
            return Err(DataError::InsufficientData {
                entity: entity_id.to_string(),
                reason: "no annual operating cash flow reported".to_string(),
            });
        }

        let capital_expenditures = self.resolve(
            series,
            CanonicalConcept::CapitalExpenditures,
            |o| self.is_annual_duration(o),
        )?;

        let splits = self.stock_splits(series)?;
        let shares = self.split_adjusted_shares(series, &splits, &mut degradations)?;
        if shares.is_empty() {
            return Err(DataError::MissingConcept {
                concept: CanonicalConcept::SharesOutstanding.to_string(),
            });
        }

        let mut periods = Vec::new();
        let fiscal_years = self.fiscal_years(&operating, &mut degradations);
        for (year_end_date, operating_cash_flow) in fiscal_years {
            let capex = match capital_expenditures.get(&year_end_date) {
                Some(&value) if value < 0.0 => {
                    warn!(
                        entity_id,
                        %year_end_date,
                        value,
                        "negative capital expenditure clamped to zero"
                    );
                    0.0
                }
                Some(&value) => value,
                None => {
                    warn!(
                        entity_id,
                        %year_end_date,
                        "capital expenditure missing, treated as zero"
                    );
                    degradations.push(Degradation::MissingCapitalExpenditure { year_end_date });
                    0.0
                }
            };

            let Some(share_count) = nearest_in_year(&shares, year_end_date) else {
                warn!(
                    entity_id,
                    %year_end_date,
                    "no share count in reporting year, period dropped"
                );
                degradations.push(Degradation::MissingShares { year_end_date });
                continue;
            };

            let share_count = share_count.abs().round() as i64;
            if share_count <= 0 {
                warn!(entity_id, %year_end_date, "share count is zero, period dropped");
                degradations.push(Degradation::NonPositiveShares { year_end_date });
                continue;
            }

            periods.push(FinancialPeriod::new(
                year_end_date,
                operating_cash_flow - capex,
                share_count,
            )?);
        }

        if periods.is_empty() {
            return Err(DataError::InsufficientData {
                entity: entity_id.to_string(),
                reason: "no fiscal year has both cash flow and share count".to_string(),
            });
        }

        let financials = HistoricalFinancials::from_periods(periods)?;
        debug!(
            entity_id,
            periods = financials.len(),
            degradations = degradations.len(),
            "normalized filings"
        );

        Ok(NormalizedFinancials {
            financials,
            degradations,
        })
    }

    fn is_annual_form(&self, observation: &ConceptObservation) -> bool {
        observation
            .form
            .as_deref()
            .is_none_or(|form| self.config.annual_forms.iter().any(|f| f == form))
    }

    fn is_annual_duration(&self, observation: &ConceptObservation) -> bool {
        self.is_annual_form(observation)
            && observation.duration_days().is_some_and(|days| {
                (self.config.min_annual_days..=self.config.max_annual_days).contains(&days)
            })
    }

    /// Per period end, the latest-filed value of the highest-priority tag.
    fn resolve(
        &self,
        series: &ConceptSeries,
        concept: CanonicalConcept,
        mut keep: impl FnMut(&ConceptObservation) -> bool,
    ) -> Result<BTreeMap<NaiveDate, f64>> {
        let mut by_period: BTreeMap<NaiveDate, (usize, Vec<&ConceptObservation>)> =
            BTreeMap::new();

        for (priority, tag) in self.config.synonyms.get_tags(concept).iter().enumerate() {
            for observation in series.get(tag).iter().filter(|o| keep(o)) {
                let (best, candidates) = by_period
                    .entry(observation.period_end)
                    .or_insert_with(|| (priority, Vec::new()));
                if *best == priority {
                    candidates.push(observation);
                }
            }
        }

        let mut resolved = BTreeMap::new();
        for (period_end, (_, candidates)) in by_period {
            if let Some(value) = latest_filed(concept, period_end, &candidates)? {
                resolved.insert(period_end, value);
            }
        }

        Ok(resolved)
    }

    /// Split dates and ratios, oldest first. Non-positive ratios are ignored.
    fn stock_splits(&self, series: &ConceptSeries) -> Result<Vec<(NaiveDate, f64)>> {
        let splits = self.resolve(series, CanonicalConcept::StockSplitRatio, |_| true)?;

        Ok(splits
            .into_iter()
            .filter(|&(date, ratio)| {
                let valid = ratio.is_finite() && ratio > 0.0;
                if !valid {
                    warn!(%date, ratio, "ignoring invalid stock split ratio");
                }
                valid
            })
            .collect())
    }

    /// Share counts per period end, restated to today's share basis.
    ///
    /// A pre-split period filed after the split already reports post-split
    /// shares and is dropped instead of being adjusted twice.
    fn split_adjusted_shares(
        &self,
        series: &ConceptSeries,
        splits: &[(NaiveDate, f64)],
        degradations: &mut Vec<Degradation>,
    ) -> Result<BTreeMap<NaiveDate, f64>> {
        let shares = self.resolve(series, CanonicalConcept::SharesOutstanding, |o| {
            if !self.is_annual_form(o) {
                return false;
            }

            let next_split = splits.iter().map(|&(date, _)| date).find(|&d| d >= o.period_end);
            let restated = next_split.is_some_and(|d| o.period_end < d && d < o.filed_date);
            if restated {
                debug!(
                    period_end = %o.period_end,
                    filed_date = %o.filed_date,
                    "dropping restated share count"
                );
                degradations.push(Degradation::SplitRestatementDropped {
                    period_end: o.period_end,
                    filed_date: o.filed_date,
                });
            }
            !restated
        })?;

        Ok(shares
            .into_iter()
            .map(|(period_end, count)| {
                let factor: f64 = splits
                    .iter()
                    .filter(|&&(date, _)| date >= period_end)
                    .map(|&(_, ratio)| ratio)
                    .product();
                (period_end, count * factor)
            })
            .collect())
    }

    /// Fiscal year ends with their operating cash flow, dropping the earlier
    /// of any two year ends that are less than a fiscal year apart.
    fn fiscal_years(
        &self,
        operating: &BTreeMap<NaiveDate, f64>,
        degradations: &mut Vec<Degradation>,
    ) -> Vec<(NaiveDate, f64)> {
        let mut years: Vec<(NaiveDate, f64)> = Vec::with_capacity(operating.len());
        // never looser than the history's own check
        let min_gap = self.config.min_annual_days.max(MIN_FISCAL_YEAR_DAYS);

        for (&date, &value) in operating {
            if let Some(&(previous, _)) = years
                .last()
                .filter(|(previous, _)| (date - *previous).num_days() < min_gap)
            {
                warn!(kept = %date, dropped = %previous, "fiscal year end collision");
                degradations.push(Degradation::FiscalYearCollision {
                    kept: date,
                    dropped: previous,
                });
                years.pop();
            }
            years.push((date, value));
        }

        years
    }
}

/// Value of the latest filing, or an ambiguity error when two filings on
/// that date disagree.
fn latest_filed(
    concept: CanonicalConcept,
    period_end: NaiveDate,
    candidates: &[&ConceptObservation],
) -> Result<Option<f64>> {
    let Some(latest) = candidates.iter().copied().max_by_key(|o| o.filed_date) else {
        return Ok(None);
    };

    if let Some(conflict) = candidates
        .iter()
        .find(|o| o.filed_date == latest.filed_date && o.value != latest.value)
    {
        return Err(DataError::AmbiguousFiling {
            concept: concept.to_string(),
            period_end,
            filed_date: latest.filed_date,
            first: latest.value,
            second: conflict.value,
        });
    }

    Ok(Some(latest.value))
}

/// Share count closest to `year_end` within the same calendar year.
fn nearest_in_year(shares: &BTreeMap<NaiveDate, f64>, year_end: NaiveDate) -> Option<f64> {
    shares
        .iter()
        .filter(|(date, _)| date.year() == year_end.year())
        .min_by_key(|(date, _)| ((**date - year_end).num_days().abs(), **date))
        .map(|(_, &count)| count)
}
