//! Runtime configuration.
//!
//! Loaded once at startup from a TOML file, with `COINCAST_`-prefixed
//! environment variables overriding individual keys
//! (e.g. `COINCAST_STORE__PATH`).

use crate::error::Result;
use crate::indicators::IndicatorParams;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub indicators: IndicatorParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// First date fetched, far enough back that every rolling window is
    /// warm long before any prediction target.
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,
    /// Days of trailing history for hourly bars.
    #[serde(default = "default_hourly_days")]
    pub hourly_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_sentiment_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_models_dir")]
    pub dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Local hour at which `watch` runs its daily cycle.
    #[serde(default = "default_hour")]
    pub hour: u32,
}

fn default_symbol() -> String {
    "BTC-USD".to_string()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_history_start() -> NaiveDate {
    // Keep ample history ahead of the fitted models' training range.
    NaiveDate::from_ymd_opt(2016, 12, 1).expect("valid literal date")
}

fn default_hourly_days() -> u64 {
    5
}

fn default_sentiment_path() -> String {
    "data/sentiment_scores.csv".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_store_path() -> String {
    "data/predictions.db".to_string()
}

fn default_hour() -> u32 {
    7
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            base_url: default_base_url(),
            history_start: default_history_start(),
            hourly_days: default_hourly_days(),
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            path: default_sentiment_path(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: default_hour(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let raw = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("COINCAST").separator("__"))
            .build()?;
        let mut parsed: Config = raw.try_deserialize()?;
        parsed.expand_paths();
        parsed.validate()?;
        Ok(parsed)
    }

    fn expand_paths(&mut self) {
        self.sentiment.path = shellexpand::tilde(&self.sentiment.path).into_owned();
        self.models.dir = shellexpand::tilde(&self.models.dir).into_owned();
        self.store.path = shellexpand::tilde(&self.store.path).into_owned();
    }

    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        if self.schedule.hour > 23 {
            return Err(crate::error::Error::InvalidParams(format!(
                "schedule.hour must be 0-23, got {}",
                self.schedule.hour
            )));
        }
        if self.market.hourly_days == 0 {
            return Err(crate::error::Error::InvalidParams(
                "market.hourly_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
