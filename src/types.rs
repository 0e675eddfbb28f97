//! Core data types shared across the forecaster.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling interval for bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
    Hourly,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Hourly => write!(f, "hourly"),
        }
    }
}

/// One OHLCV observation for a fixed time interval.
///
/// Emitted by the market data collaborator with strictly ascending,
/// unique timestamps; immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar for one calendar day, stamped at midnight.
    pub fn daily(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            ts: date.and_time(NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calendar date of the observation.
    pub fn date(&self) -> NaiveDate {
        self.ts.date()
    }
}

/// A [`Bar`] extended with the derived indicator columns.
///
/// Warm-up rows carry `None` for any indicator whose trailing window has
/// not filled yet; the engine never errors on short history. Every derived
/// field at row `i` depends only on rows `<= i`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub sma_7: Option<f64>,
    pub sma_14: Option<f64>,
    pub ema_7: f64,
    pub ema_14: f64,
    pub rsi: Option<f64>,
    pub macd: f64,
    pub signal_line: f64,
    pub bollinger_sma: Option<f64>,
    pub upper_band_bb: Option<f64>,
    pub lower_band_bb: Option<f64>,
    pub atr: Option<f64>,
    pub percent_k: Option<f64>,
    pub percent_d: Option<f64>,
    pub obv: f64,
}

impl IndicatorRow {
    /// The 14 derived columns in feature-schema order, or `None` while any
    /// of them is still warming up.
    pub fn indicator_values(&self) -> Option<[f64; 14]> {
        match (
            self.sma_7,
            self.sma_14,
            self.rsi,
            self.bollinger_sma,
            self.upper_band_bb,
            self.lower_band_bb,
            self.atr,
            self.percent_k,
            self.percent_d,
        ) {
            (
                Some(sma_7),
                Some(sma_14),
                Some(rsi),
                Some(bollinger_sma),
                Some(upper_band_bb),
                Some(lower_band_bb),
                Some(atr),
                Some(percent_k),
                Some(percent_d),
            ) => Some([
                sma_7,
                sma_14,
                self.ema_7,
                self.ema_14,
                rsi,
                self.macd,
                self.signal_line,
                bollinger_sma,
                upper_band_bb,
                lower_band_bb,
                atr,
                percent_k,
                percent_d,
                self.obv,
            ]),
            _ => None,
        }
    }

    /// True once every indicator column carries a value.
    pub fn is_complete(&self) -> bool {
        self.indicator_values().is_some()
    }
}

/// One aggregated sentiment value per calendar date.
///
/// A weighted signed average produced by the external news pipeline;
/// the range is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub date: NaiveDate,
    pub score: f64,
}

/// A persisted high/low prediction for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub predicted_high: f64,
    pub predicted_low: f64,
}
