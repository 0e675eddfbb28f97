//! One end-to-end prediction cycle.
//!
//! A cycle is an atomic, non-reentrant sequence: fetch bars → enrich →
//! fetch sentiment → assemble features → predict high → predict low →
//! upsert. Any failure aborts before the store is touched, so no partial
//! prediction is ever persisted and the next scheduled trigger can simply
//! retry.

use crate::config::Config;
use crate::data::{BarSource, SentimentSource};
use crate::error::{Error, Result};
use crate::features::{self, ResolutionTier};
use crate::indicators::{self, IndicatorParams};
use crate::pipeline::{PricePredictor, Target};
use crate::store::PredictionStore;
use crate::types::{Bar, Interval, PredictionRecord};
use chrono::NaiveDate;
use std::sync::Arc;

/// Outcome of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub record: PredictionRecord,
    pub tier: ResolutionTier,
    pub market_date: NaiveDate,
    pub sentiment_date: NaiveDate,
}

/// Wires the collaborators, the predictor, and the store into a runnable
/// cycle. The predictor is shared read-only; the store is the only mutable
/// resource and is only written at the very end.
pub struct PredictionCycle<B, S> {
    bars: B,
    sentiment: S,
    predictor: Arc<PricePredictor>,
    store: PredictionStore,
    params: IndicatorParams,
    history_start: NaiveDate,
}

impl<B: BarSource, S: SentimentSource> PredictionCycle<B, S> {
    pub fn new(
        bars: B,
        sentiment: S,
        predictor: Arc<PricePredictor>,
        store: PredictionStore,
        config: &Config,
    ) -> Self {
        Self {
            bars,
            sentiment,
            predictor,
            store,
            params: config.indicators.clone(),
            history_start: config.market.history_start,
        }
    }

    pub fn store(&self) -> &PredictionStore {
        &self.store
    }

    /// Run one cycle predicting the high/low of `session`.
    ///
    /// The target feature date is the day before the session, with the
    /// assembler's fallback tiers covering weekends and holidays. The
    /// stored record is keyed by `session` regardless of which tier
    /// resolved, so re-runs stay idempotent.
    pub async fn run_for(&self, session: NaiveDate) -> Result<CycleReport> {
        let target = session
            .pred_opt()
            .ok_or_else(|| Error::MarketData(format!("no prior day for session {session}")))?;
        tracing::info!(%session, %target, "starting prediction cycle");

        let bars = self
            .bars
            .bars(self.history_start, session, Interval::Daily)
            .await
            .map_err(Error::at_stage("market-data"))?;
        validate_ascending(&bars).map_err(Error::at_stage("market-data"))?;

        let rows = indicators::enrich(&bars, &self.params);
        let complete: Vec<_> = rows.into_iter().filter(|r| r.is_complete()).collect();
        if complete.is_empty() {
            return Err(Error::at_stage("indicators")(Error::EmptySeries {
                what: "indicator",
            }));
        }

        let scores = self
            .sentiment
            .scores()
            .await
            .map_err(Error::at_stage("sentiment"))?;

        let assembled = features::assemble(&complete, &scores, target)
            .map_err(Error::at_stage("features"))?;
        tracing::info!(
            tier = %assembled.tier,
            market_date = %assembled.market_date,
            sentiment_date = %assembled.sentiment_date,
            "features assembled"
        );

        let predicted_high = self
            .predictor
            .predict(Target::High, &assembled.vector)
            .map_err(Error::at_stage("predict-high"))?;
        let predicted_low = self
            .predictor
            .predict(Target::Low, &assembled.vector)
            .map_err(Error::at_stage("predict-low"))?;

        let record = PredictionRecord {
            date: session,
            predicted_high,
            predicted_low,
        };
        self.store
            .upsert(&record)
            .await
            .map_err(Error::at_stage("store"))?;

        tracing::info!(
            %session,
            predicted_high,
            predicted_low,
            "cycle complete"
        );
        Ok(CycleReport {
            record,
            tier: assembled.tier,
            market_date: assembled.market_date,
            sentiment_date: assembled.sentiment_date,
        })
    }
}

/// Defensive check of the bar source contract.
fn validate_ascending(bars: &[Bar]) -> Result<()> {
    if bars.is_empty() {
        return Err(Error::EmptySeries { what: "bar" });
    }
    for pair in bars.windows(2) {
        if pair[1].ts <= pair[0].ts {
            return Err(Error::UnorderedSeries(pair[1].date()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn ascending_series_passes() {
        let bars = vec![
            Bar::daily(date(1), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::daily(date(2), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(validate_ascending(&bars).is_ok());
    }

    #[test]
    fn duplicate_or_reversed_dates_fail() {
        let bars = vec![
            Bar::daily(date(2), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::daily(date(2), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(matches!(
            validate_ascending(&bars),
            Err(Error::UnorderedSeries(_))
        ));

        let bars = vec![
            Bar::daily(date(3), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::daily(date(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        assert!(matches!(
            validate_ascending(&bars),
            Err(Error::UnorderedSeries(_))
        ));
    }

    #[test]
    fn empty_series_fails() {
        assert!(matches!(
            validate_ascending(&[]),
            Err(Error::EmptySeries { .. })
        ));
    }
}
