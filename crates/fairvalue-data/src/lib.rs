#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairvalue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod edgar;
pub mod eligibility;
pub mod error;
pub mod financials;
pub mod normalize;

pub use edgar::{
    CanonicalConcept, CompanyFacts, ConceptObservation, ConceptSeries, EntityMetadata,
    Submissions, TagSynonyms, unpadded_cik,
};
pub use eligibility::{Eligibility, EligibilityConfig, EligibilityFilter, ExclusionReason};
pub use error::{DataError, Result};
pub use financials::{
    FinancialPeriod, HistoricalFinancials, MIN_FISCAL_YEAR_DAYS, parse_year_end_dates,
};
pub use normalize::{Degradation, NormalizedFinancials, Normalizer, NormalizerConfig};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
