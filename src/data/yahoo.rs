//! Yahoo Finance chart-API client.

use crate::data::BarSource;
use crate::error::{Error, Result};
use crate::types::{Bar, Interval};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;

const USER_AGENT: &str = concat!("coincast/", env!("CARGO_PKG_VERSION"));

/// Fetches OHLCV bars from the `v8/finance/chart` endpoint.
pub struct YahooChartSource {
    http: reqwest::Client,
    base_url: String,
    symbol: String,
}

impl YahooChartSource {
    pub fn new(base_url: &str, symbol: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<Quote>,
}

/// Quote arrays are index-aligned with `timestamp`; halted sessions show
/// up as nulls and are skipped.
#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

impl ChartResult {
    fn into_bars(self) -> Vec<Bar> {
        let timestamps = self.timestamp.unwrap_or_default();
        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Vec::new();
        };
        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, unix) in timestamps.iter().enumerate() {
            let fields = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
                continue;
            };
            let Some(ts) = DateTime::from_timestamp(*unix, 0) else {
                continue;
            };
            bars.push(Bar {
                ts: ts.naive_utc(),
                open,
                high,
                low,
                close,
                volume,
            });
        }
        bars
    }
}

#[async_trait]
impl BarSource for YahooChartSource {
    async fn bars(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<Bar>> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive; cover the whole end day.
        let period2 = end
            .checked_add_days(chrono::Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let interval_code = match interval {
            Interval::Daily => "1d",
            Interval::Hourly => "1h",
        };

        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval_code.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: ChartResponse = response.json().await?;

        if let Some(err) = body.chart.error {
            return Err(Error::MarketData(format!(
                "{}: {}",
                err.code, err.description
            )));
        }
        let result = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                Error::MarketData(format!("empty chart response for {}", self.symbol))
            })?;

        let bars = result.into_bars();
        tracing::debug!(
            symbol = %self.symbol,
            interval = %interval,
            count = bars.len(),
            "fetched bars"
        );
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_quote_rows_are_skipped() {
        let result = ChartResult {
            timestamp: Some(vec![1_700_000_000, 1_700_086_400, 1_700_172_800]),
            indicators: ChartIndicators {
                quote: vec![Quote {
                    open: vec![Some(1.0), None, Some(3.0)],
                    high: vec![Some(1.5), Some(2.5), Some(3.5)],
                    low: vec![Some(0.5), Some(1.5), Some(2.5)],
                    close: vec![Some(1.2), Some(2.2), Some(3.2)],
                    volume: vec![Some(10.0), Some(20.0), Some(30.0)],
                }],
            },
        };
        let bars = result.into_bars();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.2);
        assert_eq!(bars[1].close, 3.2);
    }

    #[test]
    fn missing_quote_block_yields_no_bars() {
        let result = ChartResult {
            timestamp: Some(vec![1_700_000_000]),
            indicators: ChartIndicators { quote: vec![] },
        };
        assert!(result.into_bars().is_empty());
    }

    #[test]
    fn chart_error_deserializes() {
        let raw = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.chart.error.unwrap();
        assert_eq!(err.code, "Not Found");
    }
}
