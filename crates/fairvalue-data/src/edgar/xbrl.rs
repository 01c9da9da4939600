//! XBRL company-facts records.
//!
//! The SEC publishes every XBRL fact a company has reported in a single JSON
//! document per filer, the "company facts" file. This module turns that
//! document into a [`ConceptSeries`]: one ordered list of
//! [`ConceptObservation`]s per `taxonomy:Tag` concept.
//!
//! # Example
//!
//! ```
//! use fairvalue_data::edgar::xbrl::CompanyFacts;
//!
//! let json = r#"{
//!     "cik": 320193,
//!     "entityName": "Apple Inc.",
//!     "facts": {
//!         "us-gaap": {
//!             "NetCashProvidedByUsedInOperatingActivities": {
//!                 "label": "Net Cash Provided by (Used in) Operating Activities",
//!                 "description": "Amount of cash inflow (outflow) from operating activities.",
//!                 "units": {
//!                     "USD": [{
//!                         "start": "2023-10-01", "end": "2024-09-28",
//!                         "val": 118254000000, "accn": "0000320193-24-000123",
//!                         "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2024-11-01"
//!                     }]
//!                 }
//!             }
//!         }
//!     }
//! }"#;
//!
//! let facts = CompanyFacts::parse_json(json).unwrap();
//! assert_eq!(facts.cik, "320193");
//! let ocf = facts.series.get("us-gaap:NetCashProvidedByUsedInOperatingActivities");
//! assert_eq!(ocf.len(), 1);
//! ```

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Date format used throughout the SEC JSON APIs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single reported data point for one concept.
///
/// Duration concepts (cash flows) carry a `period_start`; instant concepts
/// (share counts) do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptObservation {
    /// Start of the reporting period (None for instant facts)
    pub period_start: Option<NaiveDate>,

    /// End of the reporting period
    pub period_end: NaiveDate,

    /// Date the filing carrying this value was submitted
    pub filed_date: NaiveDate,

    /// Reported value
    pub value: f64,

    /// Unit of measure (e.g., "USD", "shares", "pure")
    pub unit: String,

    /// Form type (e.g., "10-K", "10-Q")
    pub form: Option<String>,

    /// Fiscal year
    pub fiscal_year: Option<i32>,

    /// Fiscal period (e.g., "FY", "Q1")
    pub fiscal_period: Option<String>,

    /// Accession number of the filing
    pub accession: Option<String>,
}

impl ConceptObservation {
    /// Creates an observation with only the required fields set.
    pub fn new(
        period_start: Option<NaiveDate>,
        period_end: NaiveDate,
        filed_date: NaiveDate,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            period_start,
            period_end,
            filed_date,
            value,
            unit: unit.into(),
            form: None,
            fiscal_year: None,
            fiscal_period: None,
            accession: None,
        }
    }

    /// Sets the form type.
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Returns true if this is an instant fact (point-in-time, like share counts)
    pub const fn is_instant(&self) -> bool {
        self.period_start.is_none()
    }

    /// Returns true if this is a duration fact (period-based, like cash flows)
    pub const fn is_duration(&self) -> bool {
        self.period_start.is_some()
    }

    /// Returns the duration in days if this is a duration fact
    pub fn duration_days(&self) -> Option<i64> {
        self.period_start
            .map(|start| self.period_end.signed_duration_since(start).num_days())
    }
}

/// Reported time series keyed by `taxonomy:Tag` concept name.
///
/// Observations for each concept are kept ordered by period end, then filing
/// date. A series belongs to exactly one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptSeries {
    concepts: BTreeMap<String, Vec<ConceptObservation>>,
}

impl ConceptSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation for a concept.
    pub fn push(&mut self, concept: impl Into<String>, observation: ConceptObservation) {
        let observations = self.concepts.entry(concept.into()).or_default();
        let at = observations.partition_point(|o| {
            (o.period_end, o.filed_date) <= (observation.period_end, observation.filed_date)
        });
        observations.insert(at, observation);
    }

    /// Adds many observations for a concept.
    pub fn extend<I>(&mut self, concept: &str, observations: I)
    where
        I: IntoIterator<Item = ConceptObservation>,
    {
        for observation in observations {
            self.push(concept, observation);
        }
    }

    /// Builder form of [`ConceptSeries::extend`].
    pub fn with<I>(mut self, concept: &str, observations: I) -> Self
    where
        I: IntoIterator<Item = ConceptObservation>,
    {
        self.extend(concept, observations);
        self
    }

    /// All observations for a concept, oldest period first.
    pub fn get(&self, concept: &str) -> &[ConceptObservation] {
        self.concepts.get(concept).map_or(&[], Vec::as_slice)
    }

    /// Returns true if at least one observation exists for the concept.
    pub fn contains(&self, concept: &str) -> bool {
        !self.get(concept).is_empty()
    }

    /// Gets all concept names present, sorted.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.concepts.keys().map(String::as_str)
    }

    /// Distinct units reported for a concept.
    pub fn units(&self, concept: &str) -> Vec<&str> {
        let mut units: Vec<&str> = self.get(concept).iter().map(|o| o.unit.as_str()).collect();
        units.sort_unstable();
        units.dedup();
        units
    }

    /// Number of concepts.
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// Returns true if no concept has been reported.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

/// A parsed company-facts document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFacts {
    /// CIK (Central Index Key), unpadded
    pub cik: String,

    /// Company name
    pub entity_name: String,

    /// Every reported observation
    pub series: ConceptSeries,
}

impl CompanyFacts {
    /// Parses the SEC company-facts JSON format.
    ///
    /// The format is documented at: https://www.sec.gov/edgar/sec-api-documentation
    pub fn parse_json(json: &str) -> Result<Self> {
        let api_response: SecApiResponse = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse company facts: {}", e)))?;

        let mut series = ConceptSeries::new();

        for (taxonomy, taxonomy_facts) in &api_response.facts {
            for (concept_name, concept_data) in taxonomy_facts {
                let full_concept = format!("{}:{}", taxonomy, concept_name);

                for (unit, unit_facts) in &concept_data.units {
                    for fact_data in unit_facts {
                        let observation = ConceptObservation {
                            period_start: fact_data
                                .start
                                .as_deref()
                                .map(|start| parse_date("start", start))
                                .transpose()?,
                            period_end: parse_date("end", &fact_data.end)?,
                            filed_date: parse_date("filed", &fact_data.filed)?,
                            value: fact_data.val,
                            unit: unit.clone(),
                            form: fact_data.form.clone(),
                            fiscal_year: fact_data.fy,
                            fiscal_period: fact_data.fp.clone(),
                            accession: fact_data.accn.clone(),
                        };
                        series.push(full_concept.as_str(), observation);
                    }
                }
            }
        }

        Ok(Self {
            cik: api_response.cik,
            entity_name: api_response.entity_name,
            series,
        })
    }
}

/// Parses a `YYYY-MM-DD` date, naming the field on failure.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DataError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Accepts a CIK given either as a JSON number or a string.
pub(crate) fn deserialize_cik<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cik {
        Number(u64),
        Text(String),
    }

    Ok(match Cik::deserialize(deserializer)? {
        Cik::Number(n) => n.to_string(),
        Cik::Text(s) => unpadded_cik(&s).to_string(),
    })
}

/// A CIK without surrounding whitespace or zero padding.
///
/// Company facts carry `320193` where submissions carry `0000320193`.
pub fn unpadded_cik(cik: &str) -> &str {
    match cik.trim().trim_start_matches('0') {
        "" => "0",
        digits => digits,
    }
}

// SEC API JSON structure
// Based on: https://www.sec.gov/edgar/sec-api-documentation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecApiResponse {
    #[serde(deserialize_with = "deserialize_cik")]
    cik: String,
    entity_name: String,
    #[serde(default)]
    facts: HashMap<String, HashMap<String, ConceptData>>,
}

#[derive(Debug, Deserialize)]
struct ConceptData {
    #[serde(default)]
    units: HashMap<String, Vec<FactData>>,
}

#[derive(Debug, Deserialize)]
struct FactData {
    end: String,
    val: f64,
    filed: String,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    accn: Option<String>,
    #[serde(default)]
    fy: Option<i32>,
    #[serde(default)]
    fp: Option<String>,
    #[serde(default)]
    form: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_observation_instant() {
        let obs =
            ConceptObservation::new(None, date(2023, 12, 31), date(2024, 2, 1), 1e9, "shares");

        assert!(obs.is_instant());
        assert!(!obs.is_duration());
        assert_eq!(obs.duration_days(), None);
    }

    #[test]
    fn test_observation_duration() {
        let obs = ConceptObservation::new(
            Some(date(2023, 1, 1)),
            date(2023, 12, 31),
            date(2024, 2, 1),
            100000.0,
            "USD",
        );

        assert!(!obs.is_instant());
        assert!(obs.is_duration());
        assert_eq!(obs.duration_days(), Some(364));
    }

    #[test]
    fn test_series_keeps_observations_ordered() {
        let mut series = ConceptSeries::new();
        series.push(
            "us-gaap:Assets",
            ConceptObservation::new(None, date(2023, 12, 31), date(2024, 2, 1), 2.0, "USD"),
        );
        series.push(
            "us-gaap:Assets",
            ConceptObservation::new(None, date(2022, 12, 31), date(2023, 2, 1), 1.0, "USD"),
        );
        series.push(
            "us-gaap:Assets",
            ConceptObservation::new(None, date(2022, 12, 31), date(2024, 2, 1), 1.5, "USD"),
        );

        let values: Vec<f64> = series.get("us-gaap:Assets").iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0]);
        assert!(series.get("us-gaap:Liabilities").is_empty());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_series_units() {
        let series = ConceptSeries::new().with(
            "us-gaap:NetCashProvidedByUsedInOperatingActivities",
            [
                ConceptObservation::new(None, date(2023, 12, 31), date(2024, 2, 1), 1.0, "USD"),
                ConceptObservation::new(None, date(2022, 12, 31), date(2023, 2, 1), 1.0, "EUR"),
                ConceptObservation::new(None, date(2021, 12, 31), date(2022, 2, 1), 1.0, "USD"),
            ],
        );

        assert_eq!(
            series.units("us-gaap:NetCashProvidedByUsedInOperatingActivities"),
            vec!["EUR", "USD"]
        );
    }

    #[test]
    fn test_unpadded_cik() {
        assert_eq!(unpadded_cik("0000320193"), "320193");
        assert_eq!(unpadded_cik(" 320193 "), "320193");
        assert_eq!(unpadded_cik("0000000000"), "0");
        assert_eq!(unpadded_cik("1000045"), "1000045");
    }

    #[test]
    fn test_padded_text_cik_is_unpadded() {
        let json = r#"{"cik": "0000320193", "entityName": "Apple Inc.", "facts": {}}"#;
        assert_eq!(CompanyFacts::parse_json(json).unwrap().cik, "320193");
    }

    #[test]
    fn test_parse_json_invalid() {
        assert!(CompanyFacts::parse_json("invalid json").is_err());
        assert!(CompanyFacts::parse_json("{}").is_err());
    }

    #[test]
    fn test_parse_json_bad_date() {
        let json = r#"{
            "cik": "320193",
            "entityName": "Apple Inc.",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [
                {"end": "2023-13-45", "val": 1.0, "filed": "2023-11-03"}
            ]}}}}
        }"#;

        let err = CompanyFacts::parse_json(json).unwrap_err();
        assert!(matches!(err, DataError::InvalidDate { field: "end", .. }));
    }
}
