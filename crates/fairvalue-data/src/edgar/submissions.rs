//! SEC EDGAR submissions records.
//!
//! The submissions document describes the filer: its identifier, name,
//! listed tickers, industry classification and state of incorporation.
//! This module extracts the [`EntityMetadata`] the eligibility rules and
//! the valuation report need.

use crate::edgar::xbrl::{deserialize_cik, unpadded_cik};
use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

/// Exchanges whose listing identifies the common stock ticker.
const PRIMARY_EXCHANGES: [&str; 2] = ["nyse", "nasdaq"];

/// Identifying and classification data for one filer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Regulatory filer identifier (CIK)
    pub entity_id: String,
    /// Registered company name
    pub entity_name: String,
    /// Common stock ticker
    pub ticker: Option<String>,
    /// Exchange the ticker is listed on
    pub exchange: Option<String>,
    /// Standard Industrial Classification code
    pub industry_classifier: Option<u32>,
    /// Incorporation location code (e.g., "DE", "CA", "E9")
    pub jurisdiction: Option<String>,
}

impl EntityMetadata {
    /// Create metadata with only the identifier and name set.
    pub fn new(entity_id: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            ticker: None,
            exchange: None,
            industry_classifier: None,
            jurisdiction: None,
        }
    }

    /// Set the ticker and exchange.
    pub fn with_listing(mut self, ticker: impl Into<String>, exchange: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self.exchange = Some(exchange.into());
        self
    }

    /// Set the industry classifier.
    pub const fn with_industry_classifier(mut self, code: u32) -> Self {
        self.industry_classifier = Some(code);
        self
    }

    /// Set the jurisdiction of incorporation.
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }
}

/// A parsed submissions document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submissions {
    /// Central Index Key
    #[serde(deserialize_with = "deserialize_cik")]
    pub cik: String,
    /// Company name
    #[serde(default)]
    pub name: String,
    /// Standard Industrial Classification code, as text
    #[serde(default)]
    pub sic: Option<String>,
    /// Listed tickers
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Exchange for each ticker
    #[serde(default)]
    pub exchanges: Vec<Option<String>>,
    /// State or country code of incorporation
    #[serde(default)]
    pub state_of_incorporation: Option<String>,
    /// Human-readable incorporation location
    #[serde(default)]
    pub state_of_incorporation_description: Option<String>,
}

impl Submissions {
    /// Parses the SEC submissions JSON format.
    pub fn parse_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse submissions: {}", e)))
    }

    /// Builds entity metadata from the submissions record.
    pub fn to_metadata(&self) -> Result<EntityMetadata> {
        let listing = self.primary_listing()?;

        let industry_classifier = match self.sic.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(code.parse::<u32>().map_err(|_| {
                DataError::Parse(format!("Invalid SIC code '{}' for CIK {}", code, self.cik))
            })?),
        };

        let jurisdiction = [
            &self.state_of_incorporation,
            &self.state_of_incorporation_description,
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string);

        Ok(EntityMetadata {
            entity_id: unpadded_cik(&self.cik).to_string(),
            entity_name: self.name.clone(),
            ticker: listing.as_ref().map(|(ticker, _)| ticker.clone()),
            exchange: listing.and_then(|(_, exchange)| exchange),
            industry_classifier,
            jurisdiction,
        })
    }

    /// Pick the ticker that represents the common stock.
    ///
    /// The first ticker on NYSE or Nasdaq wins. Otherwise the shortest ticker
    /// is used: Ford trades common stock as `F` and notes as `F-PC`.
    fn primary_listing(&self) -> Result<Option<(String, Option<String>)>> {
        if self.tickers.len() != self.exchanges.len() {
            return Err(DataError::Parse(format!(
                "CIK {} lists {} tickers but {} exchanges",
                self.cik,
                self.tickers.len(),
                self.exchanges.len()
            )));
        }

        let listings = self.tickers.iter().zip(&self.exchanges);

        let primary = listings.clone().find(|(_, exchange)| {
            exchange
                .as_deref()
                .is_some_and(|e| PRIMARY_EXCHANGES.contains(&e.to_ascii_lowercase().as_str()))
        });

        let chosen = primary.or_else(|| listings.min_by_key(|(ticker, _)| ticker.len()));

        Ok(chosen.map(|(ticker, exchange)| (ticker.clone(), exchange.clone())))
    }
}
