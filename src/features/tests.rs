//! Tests for schema and fallback resolution.

use super::*;
use crate::types::Bar;
use chrono::NaiveDate;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// A fully warmed-up indicator row with recognizable values.
fn make_row(day: u32, close: f64) -> IndicatorRow {
    IndicatorRow {
        bar: Bar::daily(date(day), close - 1.0, close + 2.0, close - 2.0, close, 5_000.0),
        sma_7: Some(close + 0.1),
        sma_14: Some(close + 0.2),
        ema_7: close + 0.3,
        ema_14: close + 0.4,
        rsi: Some(55.0),
        macd: 1.5,
        signal_line: 1.2,
        bollinger_sma: Some(close),
        upper_band_bb: Some(close + 4.0),
        lower_band_bb: Some(close - 4.0),
        atr: Some(3.0),
        percent_k: Some(60.0),
        percent_d: Some(58.0),
        obv: 12_345.0,
    }
}

fn make_score(day: u32, score: f64) -> SentimentScore {
    SentimentScore { date: date(day), score }
}

#[test]
fn schema_has_twenty_distinct_columns() {
    let names = column_names();
    assert_eq!(names.len(), FEATURE_DIM);
    let mut deduped = names.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), FEATURE_DIM);
    assert_eq!(names[0], "open");
    assert_eq!(names[FEATURE_DIM - 1], "sentiment_score");
}

#[test]
fn vector_values_land_in_schema_order() {
    let row = make_row(5, 100.0);
    let score = make_score(5, -0.25);
    let vector = FeatureVector::new(&row, &score).unwrap();

    assert_eq!(vector.get(FeatureColumn::Open), 99.0);
    assert_eq!(vector.get(FeatureColumn::High), 102.0);
    assert_eq!(vector.get(FeatureColumn::Low), 98.0);
    assert_eq!(vector.get(FeatureColumn::Close), 100.0);
    assert_eq!(vector.get(FeatureColumn::Volume), 5_000.0);
    assert_eq!(vector.get(FeatureColumn::Sma7), 100.1);
    assert_eq!(vector.get(FeatureColumn::Sma14), 100.2);
    assert_eq!(vector.get(FeatureColumn::Ema7), 100.3);
    assert_eq!(vector.get(FeatureColumn::Ema14), 100.4);
    assert_eq!(vector.get(FeatureColumn::Rsi), 55.0);
    assert_eq!(vector.get(FeatureColumn::Macd), 1.5);
    assert_eq!(vector.get(FeatureColumn::SignalLine), 1.2);
    assert_eq!(vector.get(FeatureColumn::BollingerSma), 100.0);
    assert_eq!(vector.get(FeatureColumn::UpperBandBb), 104.0);
    assert_eq!(vector.get(FeatureColumn::LowerBandBb), 96.0);
    assert_eq!(vector.get(FeatureColumn::Atr), 3.0);
    assert_eq!(vector.get(FeatureColumn::PercentK), 60.0);
    assert_eq!(vector.get(FeatureColumn::PercentD), 58.0);
    assert_eq!(vector.get(FeatureColumn::Obv), 12_345.0);
    assert_eq!(vector.get(FeatureColumn::SentimentScore), -0.25);
}

#[test]
fn vector_rejects_warm_up_rows() {
    let mut row = make_row(5, 100.0);
    row.rsi = None;
    let err = FeatureVector::new(&row, &make_score(5, 0.0)).unwrap_err();
    assert!(matches!(err, Error::IncompleteRow(d) if d == date(5)));
}

#[test]
fn exact_match_wins_over_fallbacks() {
    let rows: Vec<IndicatorRow> = (1..=5).map(|d| make_row(d, 100.0 + d as f64)).collect();
    let scores: Vec<SentimentScore> = (1..=5).map(|d| make_score(d, d as f64 * 0.1)).collect();

    let out = assemble(&rows, &scores, date(3)).unwrap();
    assert_eq!(out.tier, ResolutionTier::Exact);
    assert_eq!(out.market_date, date(3));
    assert_eq!(out.sentiment_date, date(3));
    assert_eq!(out.vector.get(FeatureColumn::Close), 103.0);
}

#[test]
fn missing_sentiment_drops_both_series_to_second_to_last() {
    // The market has the target date but sentiment does not: tiers must not
    // be mixed, so BOTH series fall back.
    let rows: Vec<IndicatorRow> = (1..=5).map(|d| make_row(d, 100.0 + d as f64)).collect();
    let scores = vec![make_score(1, 0.1), make_score(2, 0.2), make_score(4, 0.4)];

    let out = assemble(&rows, &scores, date(5)).unwrap();
    assert_eq!(out.tier, ResolutionTier::SecondToLast);
    assert_eq!(out.market_date, date(4));
    assert_eq!(out.sentiment_date, date(2));
}

#[test]
fn target_missing_from_both_series_falls_back_one_tier() {
    // Weekend gap: 2024-01-03 never printed a bar or a score. Both series
    // end at 01-04, so the second-to-last row of each is 01-02.
    let rows = vec![make_row(1, 101.0), make_row(2, 102.0), make_row(4, 104.0)];
    let scores = vec![make_score(1, 0.1), make_score(2, 0.2), make_score(4, 0.4)];

    let out = assemble(&rows, &scores, date(3)).unwrap();
    assert_eq!(out.tier, ResolutionTier::SecondToLast);
    assert_eq!(out.market_date, date(2));
    assert_eq!(out.sentiment_date, date(2));
    assert_eq!(out.vector.get(FeatureColumn::Close), 102.0);
    assert_eq!(out.vector.get(FeatureColumn::SentimentScore), 0.2);
}

#[test]
fn single_row_series_resolves_to_last() {
    let rows = vec![make_row(1, 101.0), make_row(2, 102.0)];
    let scores = vec![make_score(2, 0.9)];

    // Sentiment has a single row: second-to-last is out of range, use last.
    let out = assemble(&rows, &scores, date(4)).unwrap();
    assert_eq!(out.tier, ResolutionTier::Last);
    assert_eq!(out.market_date, date(2));
    assert_eq!(out.sentiment_date, date(2));
}

#[test]
fn empty_series_is_fatal() {
    let rows = vec![make_row(1, 101.0)];
    let scores = vec![make_score(1, 0.1)];

    let err = assemble(&[], &scores, date(1)).unwrap_err();
    assert!(matches!(err, Error::UnresolvableDate { .. }));

    let err = assemble(&rows, &[], date(1)).unwrap_err();
    assert!(matches!(err, Error::UnresolvableDate { .. }));
}

#[test]
fn exact_match_requires_both_series() {
    // Only one row each, and it is the target date: tier 1 applies.
    let rows = vec![make_row(7, 107.0)];
    let scores = vec![make_score(7, 0.7)];

    let out = assemble(&rows, &scores, date(7)).unwrap();
    assert_eq!(out.tier, ResolutionTier::Exact);
}
