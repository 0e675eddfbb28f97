//! Sentiment series reader.
//!
//! The external NLP pipeline scores news text and maintains a
//! `date,score` CSV; this adapter is the in-process consumer.

use crate::data::SentimentSource;
use crate::error::Result;
use crate::types::SentimentScore;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::PathBuf;

pub struct CsvSentimentSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SentimentCsvRow {
    date: NaiveDate,
    score: f64,
}

impl CsvSentimentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SentimentSource for CsvSentimentSource {
    async fn scores(&self) -> Result<Vec<SentimentScore>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let mut scores = Vec::new();
        for row in reader.deserialize() {
            let row: SentimentCsvRow = row?;
            scores.push(SentimentScore {
                date: row.date,
                score: row.score,
            });
        }
        scores.sort_by_key(|s| s.date);
        tracing::debug!(path = %self.path.display(), count = scores.len(), "loaded sentiment scores");
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_and_sorts_the_series() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,score").unwrap();
        writeln!(file, "2024-06-03, 0.42").unwrap();
        writeln!(file, "2024-06-01, -0.10").unwrap();
        writeln!(file, "2024-06-02, 0.00").unwrap();
        file.flush().unwrap();

        let source = CsvSentimentSource::new(file.path());
        let scores = source.scores().await.unwrap();

        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(scores[0].score, -0.10);
        assert_eq!(scores[2].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[tokio::test]
    async fn malformed_rows_are_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,score").unwrap();
        writeln!(file, "not-a-date,0.5").unwrap();
        file.flush().unwrap();

        let source = CsvSentimentSource::new(file.path());
        assert!(source.scores().await.is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = CsvSentimentSource::new("/nonexistent/sentiment_scores.csv");
        assert!(source.scores().await.is_err());
    }
}
