//! External data collaborators: market bars and sentiment scores.
//!
//! The core never reaches out to the network itself; it consumes these
//! traits. Concrete adapters live alongside them: a Yahoo Finance chart
//! client for bars and a CSV reader for the sentiment series that the
//! external NLP pipeline maintains.

mod sentiment;
mod yahoo;

pub use sentiment::CsvSentimentSource;
pub use yahoo::YahooChartSource;

use crate::error::Result;
use crate::types::{Bar, Interval, SentimentScore};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Supplies an ordered bar series for a date range and interval.
///
/// Contract: timestamps strictly ascending, gaps are never silently
/// filled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn bars(&self, start: NaiveDate, end: NaiveDate, interval: Interval)
        -> Result<Vec<Bar>>;
}

/// Supplies the externally computed sentiment series, keyed by date.
///
/// Dates need not align 1:1 with bar dates; the feature assembler owns the
/// fallback policy for mismatches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn scores(&self) -> Result<Vec<SentimentScore>>;
}
