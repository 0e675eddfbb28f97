//! Feature schema and single-row assembly.
//!
//! One prediction cycle consumes exactly one feature vector: the 5 OHLCV
//! fields and 14 indicator columns of one market row, plus one sentiment
//! score, in a fixed column order. The order is the contract between this
//! module and the fitted scalers; it is validated when the prediction
//! pipeline is constructed, never per call.

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use crate::types::{IndicatorRow, SentimentScore};
use chrono::NaiveDate;
use std::fmt;

/// Number of columns in a [`FeatureVector`].
pub const FEATURE_DIM: usize = 20;

/// The fixed column order the scalers were fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
    Sma7,
    Sma14,
    Ema7,
    Ema14,
    Rsi,
    Macd,
    SignalLine,
    BollingerSma,
    UpperBandBb,
    LowerBandBb,
    Atr,
    PercentK,
    PercentD,
    Obv,
    SentimentScore,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; FEATURE_DIM] = [
        FeatureColumn::Open,
        FeatureColumn::High,
        FeatureColumn::Low,
        FeatureColumn::Close,
        FeatureColumn::Volume,
        FeatureColumn::Sma7,
        FeatureColumn::Sma14,
        FeatureColumn::Ema7,
        FeatureColumn::Ema14,
        FeatureColumn::Rsi,
        FeatureColumn::Macd,
        FeatureColumn::SignalLine,
        FeatureColumn::BollingerSma,
        FeatureColumn::UpperBandBb,
        FeatureColumn::LowerBandBb,
        FeatureColumn::Atr,
        FeatureColumn::PercentK,
        FeatureColumn::PercentD,
        FeatureColumn::Obv,
        FeatureColumn::SentimentScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureColumn::Open => "open",
            FeatureColumn::High => "high",
            FeatureColumn::Low => "low",
            FeatureColumn::Close => "close",
            FeatureColumn::Volume => "volume",
            FeatureColumn::Sma7 => "sma_7",
            FeatureColumn::Sma14 => "sma_14",
            FeatureColumn::Ema7 => "ema_7",
            FeatureColumn::Ema14 => "ema_14",
            FeatureColumn::Rsi => "rsi",
            FeatureColumn::Macd => "macd",
            FeatureColumn::SignalLine => "signal_line",
            FeatureColumn::BollingerSma => "bollinger_sma",
            FeatureColumn::UpperBandBb => "upper_band_bb",
            FeatureColumn::LowerBandBb => "lower_band_bb",
            FeatureColumn::Atr => "atr",
            FeatureColumn::PercentK => "percent_k",
            FeatureColumn::PercentD => "percent_d",
            FeatureColumn::Obv => "obv",
            FeatureColumn::SentimentScore => "sentiment_score",
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names in schema order, as the scaler artifacts carry them.
pub fn column_names() -> Vec<String> {
    FeatureColumn::ALL.iter().map(|c| c.as_str().to_string()).collect()
}

/// A single assembled row pairing one market row with one sentiment score.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_DIM],
}

impl FeatureVector {
    /// Build a vector from a fully warmed-up indicator row and a score.
    pub fn new(row: &IndicatorRow, sentiment: &SentimentScore) -> Result<Self> {
        let ind = row
            .indicator_values()
            .ok_or(Error::IncompleteRow(row.bar.date()))?;
        let b = &row.bar;
        let values = [
            b.open, b.high, b.low, b.close, b.volume, ind[0], ind[1], ind[2], ind[3], ind[4],
            ind[5], ind[6], ind[7], ind[8], ind[9], ind[10], ind[11], ind[12], ind[13],
            sentiment.score,
        ];
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64; FEATURE_DIM] {
        &self.values
    }

    pub fn get(&self, column: FeatureColumn) -> f64 {
        let idx = FeatureColumn::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or(0);
        self.values[idx]
    }
}

/// Which fallback tier resolved the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// Both series carry a row keyed exactly at the target date.
    Exact,
    /// Second-to-last row of each series (weekend/holiday gap).
    SecondToLast,
    /// Last row of each series (one of them has a single row).
    Last,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTier::Exact => write!(f, "exact"),
            ResolutionTier::SecondToLast => write!(f, "second-to-last"),
            ResolutionTier::Last => write!(f, "last"),
        }
    }
}

/// An assembled feature vector plus where its inputs came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeatures {
    pub vector: FeatureVector,
    pub tier: ResolutionTier,
    pub market_date: NaiveDate,
    pub sentiment_date: NaiveDate,
}

/// Resolve one market row and one sentiment score for `target_date`.
///
/// Strategies are tried in order and the first match wins; the SAME tier is
/// applied to both series, never mixed:
///
/// 1. exact match in both series,
/// 2. second-to-last row of each (requires two rows in both),
/// 3. last row of each.
///
/// Either series being empty is fatal: no default row is invented.
pub fn assemble(
    rows: &[IndicatorRow],
    scores: &[SentimentScore],
    target_date: NaiveDate,
) -> Result<AssembledFeatures> {
    if rows.is_empty() || scores.is_empty() {
        return Err(Error::UnresolvableDate {
            target: target_date,
        });
    }

    let exact_row = rows.iter().find(|r| r.bar.date() == target_date);
    let exact_score = scores.iter().find(|s| s.date == target_date);

    let (row, score, tier) = match (exact_row, exact_score) {
        (Some(r), Some(s)) => (r, *s, ResolutionTier::Exact),
        _ if rows.len() >= 2 && scores.len() >= 2 => (
            &rows[rows.len() - 2],
            scores[scores.len() - 2],
            ResolutionTier::SecondToLast,
        ),
        _ => (
            &rows[rows.len() - 1],
            scores[scores.len() - 1],
            ResolutionTier::Last,
        ),
    };

    Ok(AssembledFeatures {
        vector: FeatureVector::new(row, &score)?,
        tier,
        market_date: row.bar.date(),
        sentiment_date: score.date,
    })
}
