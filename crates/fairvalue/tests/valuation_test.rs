//! End-to-end valuation tests, from direct input and from filings.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use fairvalue::{
    CompanyFacts, DcfEngine, DcfParameters, Error, ExclusionReason, FairValueConfig,
    FilingOutcome, ForecastInputs, Stock, Submissions, data::DataError, evaluate_filings,
    parse_year_end_dates,
};
use rstest::rstest;
use serde_json::{Value, json};

const LATEST_OPERATING_CASH_FLOW: i64 = 118_254_000_000;
const LATEST_CAPITAL_EXPENDITURE: i64 = 9_447_000_000;
const COVER_PAGE_SHARES: i64 = 15_204_137_000;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn params() -> DcfParameters {
    DcfParameters::new(0.02, 10, 0.04)
}

/// Company facts with one 10-K per fiscal year ending 28 September.
/// The last year carries the reference free cash flow and share count.
fn annual_facts(first_year: i32, last_year: i32, unit: &str) -> Value {
    let mut operating = Vec::new();
    let mut capex = Vec::new();
    let mut shares = Vec::new();

    for year in first_year..=last_year {
        let start = format!("{}-09-29", year - 1);
        let end = format!("{year}-09-28");
        let filed = format!("{year}-11-01");
        let offset = i64::from(last_year - year);

        operating.push(json!({
            "start": start, "end": end, "filed": filed, "form": "10-K",
            "val": LATEST_OPERATING_CASH_FLOW - offset * 1_000_000_000,
        }));
        capex.push(json!({
            "start": start, "end": end, "filed": filed, "form": "10-K",
            "val": LATEST_CAPITAL_EXPENDITURE,
        }));
        shares.push(json!({
            "end": end, "filed": filed, "form": "10-K",
            "val": COVER_PAGE_SHARES + offset * 100_000_000,
        }));
    }

    json!({
        "cik": 320193,
        "entityName": "Apple Inc.",
        "facts": {
            "us-gaap": {
                "NetCashProvidedByUsedInOperatingActivities": {"units": {unit: operating}},
                "PaymentsToAcquirePropertyPlantAndEquipment": {"units": {unit: capex}},
                "CommonStockSharesOutstanding": {"units": {"shares": shares}}
            }
        }
    })
}

fn facts(value: &Value) -> CompanyFacts {
    CompanyFacts::parse_json(&value.to_string()).unwrap()
}

fn submissions(sic: &str, state: &str) -> Submissions {
    Submissions::parse_json(
        &json!({
            "cik": "0000320193",
            "name": "Apple Inc.",
            "sic": sic,
            "tickers": ["AAPL"],
            "exchanges": ["Nasdaq"],
            "stateOfIncorporation": state
        })
        .to_string(),
    )
    .unwrap()
}

fn apple() -> Submissions {
    submissions("3571", "CA")
}

#[test]
fn test_single_period_direct_input() {
    let dates = parse_year_end_dates(&["2024-09-28"]).unwrap();
    let stock =
        Stock::from_direct_input("AAPL", dates, vec![108_807_000_000.0], vec![15_115_823_000])
            .unwrap();

    let result = stock.predict_fairvalue(&params(), date(2025, 1, 2)).unwrap();

    assert_relative_eq!(result.company_value, 3_886_523_142_972.991, max_relative = 1e-12);
    assert_relative_eq!(result.intrinsic_value, 257.116, epsilon = 1e-3);
    assert_eq!(result.shares_outstanding, 15_115_823_000);
    assert_eq!(result.count_filings, 1);
    assert_eq!(result.forecast_horizon, 10);
    assert_eq!(result.exchange, "NONE");
    assert_eq!(result.cik, None);
    assert!(!result.is_potentially_delisted);
}

#[test]
fn test_seventeen_years_of_filings() {
    let FilingOutcome::Eligible(stock) = evaluate_filings(
        &facts(&annual_facts(2008, 2024, "USD")),
        &apple(),
        &FairValueConfig::default(),
    )
    .unwrap() else {
        panic!("expected an eligible entity");
    };

    assert_eq!(stock.ticker_id(), "AAPL");
    assert!(stock.degradations().is_empty());
    assert!(stock.history().missing_years().is_empty());

    let result = stock.predict_fairvalue(&params(), date(2025, 1, 2)).unwrap();

    assert_eq!(result.count_filings, 17);
    assert_eq!(result.last_filing_date, date(2024, 9, 28));
    assert_eq!(result.shares_outstanding, 15_204_137_000);
    assert_relative_eq!(result.intrinsic_value, 255.6227, epsilon = 1e-3);
    assert_eq!(result.exchange, "Nasdaq");
    assert_eq!(result.cik.as_deref(), Some("320193"));
    assert_eq!(result.entity_name.as_deref(), Some("Apple Inc."));

    let features = stock.historical_features().unwrap();
    assert!(features.median_fcf_growth_all > 0.0);
}

#[test]
fn test_history_is_valued_as_of_the_forecast_date() {
    let stock = Stock::from_filings(
        &facts(&annual_facts(2008, 2024, "USD")),
        &apple(),
        &FairValueConfig::default(),
    )
    .unwrap();

    let result = stock.predict_fairvalue(&params(), date(2020, 1, 2)).unwrap();

    assert_eq!(result.count_filings, 12);
    assert_eq!(result.last_filing_date, date(2019, 9, 28));
}

#[test]
fn test_blank_check_company_is_excluded() {
    let outcome = evaluate_filings(
        &facts(&annual_facts(2020, 2024, "USD")),
        &submissions("6770", "DE"),
        &FairValueConfig::default(),
    )
    .unwrap();

    assert_eq!(outcome.exclusion(), Some(ExclusionReason::Spac));
    assert!(outcome.stock().is_none());
}

#[test]
fn test_restated_filing_uses_latest_and_same_day_conflict_fails() {
    let mut restated = annual_facts(2023, 2024, "USD");
    let amendment = json!({
        "start": "2023-09-29", "end": "2024-09-28", "filed": "2025-01-15", "form": "10-K/A",
        "val": LATEST_OPERATING_CASH_FLOW + 1_000_000_000,
    });
    restated["facts"]["us-gaap"]["NetCashProvidedByUsedInOperatingActivities"]["units"]["USD"]
        .as_array_mut()
        .unwrap()
        .push(amendment);

    let stock = Stock::from_filings(&facts(&restated), &apple(), &FairValueConfig::default())
        .unwrap();
    assert_eq!(
        stock.history().latest().free_cash_flow,
        (LATEST_OPERATING_CASH_FLOW + 1_000_000_000 - LATEST_CAPITAL_EXPENDITURE) as f64
    );

    let mut conflicting = annual_facts(2023, 2024, "USD");
    let duplicate = json!({
        "start": "2023-09-29", "end": "2024-09-28", "filed": "2024-11-01", "form": "10-K",
        "val": LATEST_OPERATING_CASH_FLOW + 1_000_000_000,
    });
    conflicting["facts"]["us-gaap"]["NetCashProvidedByUsedInOperatingActivities"]["units"]["USD"]
        .as_array_mut()
        .unwrap()
        .push(duplicate);

    let err = Stock::from_filings(&facts(&conflicting), &apple(), &FairValueConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::Data(DataError::AmbiguousFiling { .. })));
}

#[rstest]
#[case::zero(0)]
#[case::negative(-15_115_823_000)]
fn test_non_positive_share_count_is_a_parameter_error(#[case] shares: i64) {
    let stock = Stock::from_direct_input(
        "AAPL",
        vec![date(2024, 9, 28)],
        vec![108_807_000_000.0],
        vec![15_115_823_000],
    )
    .unwrap()
    .with_latest_shares_outstanding(shares);

    let err = stock.predict_fairvalue(&params(), date(2025, 1, 2)).unwrap_err();
    assert!(err.is_invalid_parameter());
}

#[test]
fn test_zero_shares_in_direct_input_rejected_at_construction() {
    let err = Stock::from_direct_input("AAPL", vec![date(2024, 9, 28)], vec![1.0], vec![0])
        .unwrap_err();
    assert!(matches!(err, Error::Data(DataError::NonPositiveShares { .. })));
}

#[test]
fn test_one_filing_period_matches_direct_input() {
    let from_filings = Stock::from_filings(
        &facts(&annual_facts(2024, 2024, "USD")),
        &apple(),
        &FairValueConfig::default(),
    )
    .unwrap();
    let direct = Stock::from_direct_input(
        "AAPL",
        vec![date(2024, 9, 28)],
        vec![(LATEST_OPERATING_CASH_FLOW - LATEST_CAPITAL_EXPENDITURE) as f64],
        vec![COVER_PAGE_SHARES],
    )
    .unwrap();

    assert_eq!(from_filings.history(), direct.history());

    let a = from_filings.valuation(&params(), date(2025, 1, 2)).unwrap();
    let b = direct.valuation(&params(), date(2025, 1, 2)).unwrap();
    assert_eq!(a, b);
}

#[rstest]
#[case::blank_check("6770", "DE", "USD", ExclusionReason::Spac)]
#[case::foreign_incorporation("3571", "E9", "USD", ExclusionReason::NonDomestic)]
#[case::foreign_currency("3571", "DE", "EUR", ExclusionReason::NonDomesticCurrency)]
fn test_excluded_entities_never_reach_valuation(
    #[case] sic: &str,
    #[case] state: &str,
    #[case] unit: &str,
    #[case] reason: ExclusionReason,
) {
    // duplicate same-day filing that would fail normalization
    let mut value = annual_facts(2022, 2024, unit);
    let duplicate = json!({
        "start": "2023-09-29", "end": "2024-09-28", "filed": "2024-11-01", "form": "10-K",
        "val": 1,
    });
    value["facts"]["us-gaap"]["NetCashProvidedByUsedInOperatingActivities"]["units"][unit]
        .as_array_mut()
        .unwrap()
        .push(duplicate);

    let outcome =
        evaluate_filings(&facts(&value), &submissions(sic, state), &FairValueConfig::default())
            .unwrap();
    match outcome {
        FilingOutcome::Excluded { entity_id, reason: actual } => {
            assert_eq!(entity_id, "320193");
            assert_eq!(actual, reason);
        }
        FilingOutcome::Eligible(_) => panic!("excluded entity was normalized"),
    }

    let err = Stock::from_filings(
        &facts(&value),
        &submissions(sic, state),
        &FairValueConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Data(DataError::ExcludedEntity { .. })));
}

#[rstest]
#[case::other_filer(json!(1_750))]
#[case::padded_other_filer(json!("0000001750"))]
fn test_facts_and_submissions_must_describe_one_filer(#[case] cik: Value) {
    let mut value = annual_facts(2022, 2024, "USD");
    value["cik"] = cik;

    let err = evaluate_filings(&facts(&value), &apple(), &FairValueConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Data(DataError::EntityMismatch { ref facts, ref submissions })
            if facts == "1750" && submissions == "320193"
    ));
}

#[test]
fn test_padded_and_unpadded_ciks_match() {
    let mut value = annual_facts(2022, 2024, "USD");
    value["cik"] = json!("0000320193");

    let outcome = evaluate_filings(&facts(&value), &apple(), &FairValueConfig::default()).unwrap();
    assert_eq!(outcome.stock().unwrap().metadata().unwrap().entity_id, "320193");
}

#[test]
fn test_stale_filings_flagged() {
    let stock = Stock::from_filings(
        &facts(&annual_facts(2020, 2022, "USD")),
        &apple(),
        &FairValueConfig::default(),
    )
    .unwrap();

    let result = stock.predict_fairvalue(&params(), date(2025, 1, 2)).unwrap();

    assert_eq!(result.last_filing_date, date(2022, 9, 28));
    assert_eq!(result.days_since_filing, 827);
    assert!(result.is_potentially_delisted);
}

#[test]
fn test_explicit_forecast_matches_generated_projection() {
    let stock = Stock::from_direct_input(
        "AAPL",
        vec![date(2024, 9, 28)],
        vec![108_807_000_000.0],
        vec![15_115_823_000],
    )
    .unwrap();
    let generated = stock.valuation(&params(), date(2025, 1, 2)).unwrap();

    let forecast = ForecastInputs {
        year_end_dates: generated.projections.iter().map(|p| p.year_end_date).collect(),
        free_cash_flows: generated.projections.iter().map(|p| p.cash_flow).collect(),
        discounting_rates: vec![0.04; 10],
        shares_outstanding: 15_115_823_000,
        terminal_growth_rate: 0.02,
    };
    let explicit = DcfEngine::default().value_forecast(&forecast).unwrap();

    assert_relative_eq!(explicit.company_value, 3_886_523_142_972.991, max_relative = 1e-12);
    assert_relative_eq!(explicit.intrinsic_value, generated.intrinsic_value, max_relative = 1e-12);

    let err: Error = DcfEngine::default()
        .value_forecast(&ForecastInputs {
            terminal_growth_rate: 0.04,
            ..forecast
        })
        .unwrap_err()
        .into();
    assert!(err.is_invalid_parameter());
}
