//! Canonical concepts and their XBRL tag synonyms.
//!
//! Different companies, and the same company across different years, use
//! different XBRL tags for the same economic quantity. The synonym table maps
//! each canonical concept to a prioritized list of acceptable tags. It is plain
//! data so callers can extend it without touching the normalizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Financial quantities the valuation pipeline needs from filings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalConcept {
    /// Net cash provided by operating activities
    OperatingCashFlow,
    /// Payments to acquire property, plant and equipment
    CapitalExpenditures,
    /// Common shares outstanding at the balance sheet date
    SharesOutstanding,
    /// Stock split conversion ratio
    StockSplitRatio,
}

impl CanonicalConcept {
    /// Returns all canonical concepts.
    pub const fn all() -> [Self; 4] {
        [
            Self::OperatingCashFlow,
            Self::CapitalExpenditures,
            Self::SharesOutstanding,
            Self::StockSplitRatio,
        ]
    }

    /// Snake-case name used in errors and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::CapitalExpenditures => "capital_expenditures",
            Self::SharesOutstanding => "shares_outstanding",
            Self::StockSplitRatio => "stock_split_ratio",
        }
    }

    /// Returns true for concepts measured in the reporting currency.
    pub const fn is_monetary(&self) -> bool {
        matches!(self, Self::OperatingCashFlow | Self::CapitalExpenditures)
    }
}

impl fmt::Display for CanonicalConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common US-GAAP and DEI tags
pub mod tags {
    /// Operating Cash Flows
    pub const OPERATING_CASH_FLOW: &str = "us-gaap:NetCashProvidedByUsedInOperatingActivities";

    /// Alternative: Operating Cash Flows from continuing operations
    pub const OPERATING_CASH_FLOW_CONTINUING: &str =
        "us-gaap:NetCashProvidedByUsedInOperatingActivitiesContinuingOperations";

    /// Alternative: Operating Cash Flows
    pub const OPERATING_CASH_FLOW_ALT: &str = "us-gaap:CashProvidedByUsedInOperatingActivities";

    /// Capital Expenditures
    pub const CAPITAL_EXPENDITURES: &str = "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment";

    /// Alternative: Capital Expenditures on productive assets
    pub const CAPITAL_EXPENDITURES_PRODUCTIVE: &str = "us-gaap:PaymentsToAcquireProductiveAssets";

    /// Alternative: Capital Improvements
    pub const CAPITAL_EXPENDITURES_ALT: &str = "us-gaap:PaymentsForCapitalImprovements";

    /// Common Stock Shares Outstanding
    pub const SHARES_OUTSTANDING: &str = "us-gaap:CommonStockSharesOutstanding";

    /// Cover-page shares outstanding
    pub const ENTITY_SHARES_OUTSTANDING: &str = "dei:EntityCommonStockSharesOutstanding";

    /// Stock split conversion ratio
    pub const STOCK_SPLIT_RATIO: &str = "us-gaap:StockholdersEquityNoteStockSplitConversionRatio1";
}

/// Maps each canonical concept to its prioritized XBRL tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSynonyms {
    tags: BTreeMap<CanonicalConcept, Vec<String>>,
}

impl Default for TagSynonyms {
    fn default() -> Self {
        let mut tags = BTreeMap::new();

        tags.insert(
            CanonicalConcept::OperatingCashFlow,
            vec![
                tags::OPERATING_CASH_FLOW.to_string(),
                tags::OPERATING_CASH_FLOW_CONTINUING.to_string(),
                tags::OPERATING_CASH_FLOW_ALT.to_string(),
            ],
        );

        tags.insert(
            CanonicalConcept::CapitalExpenditures,
            vec![
                tags::CAPITAL_EXPENDITURES.to_string(),
                tags::CAPITAL_EXPENDITURES_PRODUCTIVE.to_string(),
                tags::CAPITAL_EXPENDITURES_ALT.to_string(),
            ],
        );

        tags.insert(
            CanonicalConcept::SharesOutstanding,
            vec![
                tags::SHARES_OUTSTANDING.to_string(),
                tags::ENTITY_SHARES_OUTSTANDING.to_string(),
            ],
        );

        tags.insert(
            CanonicalConcept::StockSplitRatio,
            vec![tags::STOCK_SPLIT_RATIO.to_string()],
        );

        Self { tags }
    }
}

impl TagSynonyms {
    /// An empty table; every concept resolves to no tags.
    pub const fn empty() -> Self {
        Self {
            tags: BTreeMap::new(),
        }
    }

    /// Replaces the tag list for a concept, highest priority first.
    pub fn with_tags<I, S>(mut self, concept: CanonicalConcept, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .insert(concept, tags.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a lowest-priority tag for a concept.
    pub fn push_tag(&mut self, concept: CanonicalConcept, tag: impl Into<String>) {
        self.tags.entry(concept).or_default().push(tag.into());
    }

    /// Get possible XBRL tags for a concept, highest priority first.
    pub fn get_tags(&self, concept: CanonicalConcept) -> &[String] {
        self.tags.get(&concept).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_concept() {
        let synonyms = TagSynonyms::default();

        for concept in CanonicalConcept::all() {
            assert!(!synonyms.get_tags(concept).is_empty(), "{concept}");
        }
        assert_eq!(
            synonyms.get_tags(CanonicalConcept::OperatingCashFlow)[0],
            tags::OPERATING_CASH_FLOW
        );
    }

    #[test]
    fn test_extend_table() {
        let mut synonyms =
            TagSynonyms::empty().with_tags(CanonicalConcept::CapitalExpenditures, ["a:X", "a:Y"]);
        synonyms.push_tag(CanonicalConcept::CapitalExpenditures, "a:Z");

        assert_eq!(
            synonyms.get_tags(CanonicalConcept::CapitalExpenditures),
            ["a:X", "a:Y", "a:Z"]
        );
        assert!(synonyms.get_tags(CanonicalConcept::SharesOutstanding).is_empty());
    }

    #[test]
    fn test_monetary_concepts() {
        assert!(CanonicalConcept::OperatingCashFlow.is_monetary());
        assert!(CanonicalConcept::CapitalExpenditures.is_monetary());
        assert!(!CanonicalConcept::SharesOutstanding.is_monetary());
        assert_eq!(CanonicalConcept::SharesOutstanding.to_string(), "shares_outstanding");
    }
}
