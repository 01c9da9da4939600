//! Entity eligibility rules.
//!
//! Decides whether an entity's filings may be normalized and valued at all.
//! Exclusion is a classification, not a failure: callers surface the reason
//! and skip the entity.
//!
//! Rules are applied in order and the first match wins:
//! 1. blank-check industry classifier -> [`ExclusionReason::Spac`]
//! 2. jurisdiction outside the domestic set -> [`ExclusionReason::NonDomestic`]
//! 3. any cash-flow observation in a foreign unit -> [`ExclusionReason::NonDomesticCurrency`]

use crate::edgar::concepts::{CanonicalConcept, TagSynonyms};
use crate::edgar::submissions::EntityMetadata;
use crate::edgar::xbrl::ConceptSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// SIC code the SEC assigns to blank check companies.
pub const BLANK_CHECK_SIC: u32 = 6770;

/// US state and District of Columbia incorporation codes.
pub const US_JURISDICTIONS: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH", "NJ",
    "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA", "VT", "WA",
    "WI", "WV", "WY",
];

/// Why an entity was excluded from valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionReason {
    /// Blank check company with no operating business
    Spac,
    /// Incorporated outside the domestic jurisdictions
    NonDomestic,
    /// Cash flows reported in a currency other than the reporting currency
    NonDomesticCurrency,
}

impl ExclusionReason {
    /// Stable code used in reports.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Spac => "SPAC",
            Self::NonDomestic => "NON_DOMESTIC",
            Self::NonDomesticCurrency => "NON_DOMESTIC_CURRENCY",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of the eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    /// Filings may be normalized
    Eligible,
    /// Filings must not be processed
    Excluded(ExclusionReason),
}

impl Eligibility {
    /// Returns true for [`Eligibility::Eligible`].
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// The exclusion reason, if any.
    pub const fn exclusion(&self) -> Option<ExclusionReason> {
        match self {
            Self::Eligible => None,
            Self::Excluded(reason) => Some(*reason),
        }
    }
}

/// Configuration for the eligibility rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Industry classifier identifying blank check companies (default: 6770)
    pub blank_check_classifier: u32,
    /// Incorporation codes treated as domestic (default: US states and DC)
    pub domestic_jurisdictions: BTreeSet<String>,
    /// Currency unit cash flows must be reported in (default: "USD")
    pub reporting_currency: String,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            blank_check_classifier: BLANK_CHECK_SIC,
            domestic_jurisdictions: US_JURISDICTIONS.iter().map(|s| s.to_string()).collect(),
            reporting_currency: "USD".to_string(),
        }
    }
}

/// Applies the eligibility rules to one entity.
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    config: EligibilityConfig,
    synonyms: TagSynonyms,
}

impl EligibilityFilter {
    /// Create a filter with the given configuration and the default tag table.
    pub fn new(config: EligibilityConfig) -> Self {
        Self {
            config,
            synonyms: TagSynonyms::default(),
        }
    }

    /// Use a custom tag table to locate the cash-flow concepts.
    pub fn with_synonyms(mut self, synonyms: TagSynonyms) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Get the configuration.
    pub const fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Classify an entity. Pure; the first matching rule wins.
    pub fn evaluate(&self, metadata: &EntityMetadata, series: &ConceptSeries) -> Eligibility {
        if metadata.industry_classifier == Some(self.config.blank_check_classifier) {
            return Eligibility::Excluded(ExclusionReason::Spac);
        }

        let domestic = metadata
            .jurisdiction
            .as_ref()
            .is_some_and(|j| self.config.domestic_jurisdictions.contains(j));
        if !domestic {
            return Eligibility::Excluded(ExclusionReason::NonDomestic);
        }

        let foreign_unit = CanonicalConcept::all()
            .into_iter()
            .filter(CanonicalConcept::is_monetary)
            .flat_map(|concept| self.synonyms.get_tags(concept))
            .flat_map(|tag| series.get(tag))
            .any(|observation| observation.unit != self.config.reporting_currency);
        if foreign_unit {
            return Eligibility::Excluded(ExclusionReason::NonDomesticCurrency);
        }

        Eligibility::Eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::concepts::tags;
    use crate::edgar::xbrl::ConceptObservation;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn series_in(unit: &str) -> ConceptSeries {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let filed = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        ConceptSeries::new()
            .with(
                tags::OPERATING_CASH_FLOW,
                [ConceptObservation::new(None, end, filed, 10.0, "USD")],
            )
            .with(
                tags::CAPITAL_EXPENDITURES,
                [ConceptObservation::new(None, end, filed, 2.0, unit)],
            )
    }

    fn delaware() -> EntityMetadata {
        EntityMetadata::new("1", "Test Corp")
            .with_industry_classifier(3571)
            .with_jurisdiction("DE")
    }

    #[test]
    fn test_domestic_entity_is_eligible() {
        let filter = EligibilityFilter::default();
        assert_eq!(filter.evaluate(&delaware(), &series_in("USD")), Eligibility::Eligible);
    }

    #[test]
    fn test_blank_check_is_spac() {
        let filter = EligibilityFilter::default();
        let spac = delaware().with_industry_classifier(BLANK_CHECK_SIC);

        // SPAC takes precedence over the currency rule
        assert_eq!(
            filter.evaluate(&spac, &series_in("EUR")),
            Eligibility::Excluded(ExclusionReason::Spac)
        );
    }

    #[rstest]
    #[case(Some("E9"))]
    #[case(Some("Cayman Islands"))]
    #[case(None)]
    fn test_non_domestic_jurisdiction(#[case] jurisdiction: Option<&str>) {
        let filter = EligibilityFilter::default();
        let mut metadata = delaware();
        metadata.jurisdiction = jurisdiction.map(str::to_string);

        assert_eq!(
            filter.evaluate(&metadata, &series_in("USD")),
            Eligibility::Excluded(ExclusionReason::NonDomestic)
        );
    }

    #[test]
    fn test_foreign_currency_capex() {
        let filter = EligibilityFilter::default();
        assert_eq!(
            filter.evaluate(&delaware(), &series_in("CAD")),
            Eligibility::Excluded(ExclusionReason::NonDomesticCurrency)
        );
    }

    #[test]
    fn test_share_units_are_not_currency() {
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let series = series_in("USD").with(
            tags::SHARES_OUTSTANDING,
            [ConceptObservation::new(None, end, end, 5.0, "shares")],
        );

        assert!(EligibilityFilter::default().evaluate(&delaware(), &series).is_eligible());
    }

    #[test]
    fn test_overridden_config() {
        let config = EligibilityConfig {
            domestic_jurisdictions: ["E9".to_string()].into_iter().collect(),
            reporting_currency: "EUR".to_string(),
            ..Default::default()
        };
        let filter = EligibilityFilter::new(config);
        let metadata = delaware().with_jurisdiction("E9");

        // operating cash flow is still reported in USD
        assert!(!filter.evaluate(&metadata, &series_in("EUR")).is_eligible());

        let mut series = ConceptSeries::new();
        series.push(
            tags::OPERATING_CASH_FLOW,
            ConceptObservation::new(
                None,
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                1.0,
                "EUR",
            ),
        );
        assert!(filter.evaluate(&metadata, &series).is_eligible());
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(ExclusionReason::Spac.to_string(), "SPAC");
        assert_eq!(
            serde_json::to_string(&ExclusionReason::NonDomesticCurrency).unwrap(),
            "\"NON_DOMESTIC_CURRENCY\""
        );
        assert_eq!(
            Eligibility::Excluded(ExclusionReason::NonDomestic).exclusion(),
            Some(ExclusionReason::NonDomestic)
        );
    }
}
