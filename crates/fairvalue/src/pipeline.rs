//! Filing pipeline: eligibility screening followed by normalization.

use crate::config::FairValueConfig;
use crate::error::Result;
use crate::stock::Stock;
use fairvalue_data::{
    CompanyFacts, DataError, Eligibility, EligibilityFilter, ExclusionReason, Normalizer,
    Submissions, unpadded_cik,
};
use tracing::info;

/// Outcome of running one entity's filings through the pipeline.
#[derive(Debug, Clone)]
pub enum FilingOutcome {
    /// The entity passed screening and has a usable history.
    Eligible(Box<Stock>),
    /// The entity was screened out. Not an error.
    Excluded {
        /// Regulatory filer identifier
        entity_id: String,
        /// Rule that excluded it
        reason: ExclusionReason,
    },
}

impl FilingOutcome {
    /// The stock, when eligible.
    pub fn stock(&self) -> Option<&Stock> {
        match self {
            Self::Eligible(stock) => Some(&**stock),
            Self::Excluded { .. } => None,
        }
    }

    /// The exclusion reason, when excluded.
    pub const fn exclusion(&self) -> Option<ExclusionReason> {
        match self {
            Self::Eligible(_) => None,
            Self::Excluded { reason, .. } => Some(*reason),
        }
    }
}

/// Screen an entity and normalize its filings.
///
/// Excluded entities never reach the normalizer. The ticker is the primary
/// listing from the submissions, or the CIK when the entity has none.
///
/// # Errors
///
/// [`DataError::EntityMismatch`] when the two documents belong to different
/// filers, metadata that cannot be read, and every normalization failure
/// (insufficient data, missing shares, ambiguous filings).
pub fn evaluate_filings(
    facts: &CompanyFacts,
    submissions: &Submissions,
    config: &FairValueConfig,
) -> Result<FilingOutcome> {
    let metadata = submissions.to_metadata()?;
    if unpadded_cik(&facts.cik) != metadata.entity_id {
        return Err(DataError::EntityMismatch {
            facts: facts.cik.clone(),
            submissions: metadata.entity_id.clone(),
        }
        .into());
    }

    let filter = EligibilityFilter::new(config.eligibility.clone())
        .with_synonyms(config.normalizer.synonyms.clone());
    let eligibility = filter.evaluate(&metadata, &facts.series);

    if let Eligibility::Excluded(reason) = eligibility {
        info!(entity_id = %metadata.entity_id, %reason, "entity excluded");
        return Ok(FilingOutcome::Excluded {
            entity_id: metadata.entity_id,
            reason,
        });
    }

    let normalized = Normalizer::new(config.normalizer.clone()).normalize(
        &metadata.entity_id,
        &facts.series,
        &eligibility,
    )?;

    let ticker_id = metadata
        .ticker
        .clone()
        .unwrap_or_else(|| metadata.entity_id.clone());

    Ok(FilingOutcome::Eligible(Box::new(Stock::from_normalized(
        ticker_id,
        metadata,
        normalized,
        config.valuation.clone(),
    ))))
}
