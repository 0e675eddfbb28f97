//! Error types shared across the forecaster.

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("market data error: {0}")]
    MarketData(String),

    #[error("bar series is not strictly ascending at {0}")]
    UnorderedSeries(NaiveDate),

    #[error("{what} series is empty")]
    EmptySeries { what: &'static str },

    #[error("no usable row for target date {target} in either series")]
    UnresolvableDate { target: NaiveDate },

    #[error("indicator row for {0} is still in warm-up")]
    IncompleteRow(NaiveDate),

    #[error("schema mismatch: expected columns {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("shape mismatch in {context}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("model error: {0}")]
    Model(String),

    #[error("{stage} stage failed: {source}")]
    Cycle {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error with the name of the cycle stage it aborted.
    pub fn at_stage(stage: &'static str) -> impl FnOnce(Error) -> Error {
        move |source| Error::Cycle {
            stage,
            source: Box::new(source),
        }
    }

    /// Name of the cycle stage this error aborted, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Error::Cycle { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
