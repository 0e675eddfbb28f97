//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::indicators::IndicatorParams;
    use chrono::NaiveDate;

    #[test]
    fn test_market_config_defaults() {
        let config: MarketConfig = toml::from_str("").unwrap();
        assert_eq!(config.symbol, "BTC-USD");
        assert_eq!(config.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(
            config.history_start,
            NaiveDate::from_ymd_opt(2016, 12, 1).unwrap()
        );
        assert_eq!(config.hourly_days, 5);
    }

    #[test]
    fn test_market_config_overrides() {
        let toml_str = r#"
symbol = "ETH-USD"
history_start = "2020-01-01"
hourly_days = 3
"#;
        let config: MarketConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.symbol, "ETH-USD");
        assert_eq!(
            config.history_start,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(config.hourly_days, 3);
    }

    #[test]
    fn test_sentiment_config_default_path() {
        let config: SentimentConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, "data/sentiment_scores.csv");
    }

    #[test]
    fn test_store_and_models_defaults() {
        let store: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(store.path, "data/predictions.db");

        let models: ModelsConfig = toml::from_str("").unwrap();
        assert_eq!(models.dir, "models");
    }

    #[test]
    fn test_schedule_config_default_hour() {
        let config: ScheduleConfig = toml::from_str("").unwrap();
        assert_eq!(config.hour, 7);

        let config: ScheduleConfig = toml::from_str("hour = 22").unwrap();
        assert_eq!(config.hour, 22);
    }

    #[test]
    fn test_indicator_params_defaults() {
        let params: IndicatorParams = toml::from_str("").unwrap();
        assert_eq!(params.sma_short, 7);
        assert_eq!(params.sma_long, 14);
        assert_eq!(params.rsi_window, 14);
        assert_eq!(params.macd_fast, 12);
        assert_eq!(params.macd_slow, 26);
        assert_eq!(params.macd_signal, 9);
        assert_eq!(params.bollinger_window, 20);
        assert_eq!(params.bollinger_num_std, 2.0);
        assert_eq!(params.atr_window, 14);
        assert_eq!(params.stochastic_window, 14);
        assert_eq!(params.stochastic_smooth, 3);
    }

    #[test]
    fn test_indicator_params_partial_override() {
        let toml_str = r#"
rsi_window = 21
bollinger_num_std = 2.5
"#;
        let params: IndicatorParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.rsi_window, 21);
        assert_eq!(params.bollinger_num_std, 2.5);
        // Untouched fields keep their defaults.
        assert_eq!(params.macd_fast, 12);
    }

    #[test]
    fn test_full_config_from_empty_tables() {
        let toml_str = r#"
[market]
[sentiment]
[models]
[store]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.hour, 7);
    }

    #[test]
    fn test_validate_rejects_bad_hour() {
        let toml_str = r#"
[schedule]
hour = 24
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_windows() {
        let toml_str = r#"
[indicators]
macd_fast = 30
macd_slow = 26
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
