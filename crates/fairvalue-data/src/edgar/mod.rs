//! SEC EDGAR filing records.
//!
//! This module provides typed representations of:
//! - XBRL company facts (one observation series per `taxonomy:Tag` concept)
//! - Submissions records (filer identity, listing and classification)
//! - The canonical concept table mapping economic quantities to XBRL tags
//!
//! Documents arrive already loaded; nothing here performs I/O.
//!
//! # Example
//!
//! ```
//! use fairvalue_data::edgar::{CanonicalConcept, Submissions, TagSynonyms};
//!
//! let json = r#"{"cik": "0000320193", "name": "Apple Inc.", "sic": "3571",
//!     "tickers": ["AAPL"], "exchanges": ["Nasdaq"], "stateOfIncorporation": "CA"}"#;
//! let metadata = Submissions::parse_json(json)?.to_metadata()?;
//! assert_eq!(metadata.ticker.as_deref(), Some("AAPL"));
//!
//! let synonyms = TagSynonyms::default();
//! assert!(!synonyms.get_tags(CanonicalConcept::OperatingCashFlow).is_empty());
//! # Ok::<(), fairvalue_data::DataError>(())
//! ```

pub mod concepts;
pub mod submissions;
pub mod xbrl;

// Re-export main types
pub use concepts::{CanonicalConcept, TagSynonyms, tags};
pub use submissions::{EntityMetadata, Submissions};
pub use xbrl::{CompanyFacts, ConceptObservation, ConceptSeries, unpadded_cik};
