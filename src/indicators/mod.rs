//! Technical indicator engine.
//!
//! A pure, deterministic pass over an ordered OHLCV series that appends the
//! 14 derived columns consumed by the prediction pipeline. Every value at
//! row `i` is a function of rows `<= i` only, so replaying a fixed bar
//! sequence always reproduces the same output and nothing leaks from the
//! future into a prediction.
//!
//! Insufficient history is not an error: rows inside an indicator's warm-up
//! window carry `None` and callers truncate the prefix before use.


use crate::types::{Bar, IndicatorRow};
use serde::Deserialize;

/// Window sizes for the derived columns.
///
/// The defaults match the fitted models; override them only when refitting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_short: usize,
    pub ema_long: usize,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,
    pub atr_window: usize,
    pub stochastic_window: usize,
    pub stochastic_smooth: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short: 7,
            sma_long: 14,
            ema_short: 7,
            ema_long: 14,
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            atr_window: 14,
            stochastic_window: 14,
            stochastic_smooth: 3,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> crate::error::Result<()> {
        let windows = [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("ema_short", self.ema_short),
            ("ema_long", self.ema_long),
            ("rsi_window", self.rsi_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_window", self.atr_window),
            ("stochastic_window", self.stochastic_window),
            ("stochastic_smooth", self.stochastic_smooth),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(crate::error::Error::InvalidParams(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.bollinger_window < 2 {
            return Err(crate::error::Error::InvalidParams(
                "bollinger_window must be at least 2".to_string(),
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(crate::error::Error::InvalidParams(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if !self.bollinger_num_std.is_finite() || self.bollinger_num_std <= 0.0 {
            return Err(crate::error::Error::InvalidParams(
                "bollinger_num_std must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Simple moving average over a trailing window.
///
/// The first `window - 1` entries are `None`.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Like [`sma`], but over a series that may itself contain gaps.
///
/// A window containing any `None` yields `None`.
pub fn sma_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mut sum = 0.0;
        let mut full = true;
        for v in slice {
            match v {
                Some(x) => sum += x,
                None => {
                    full = false;
                    break;
                }
            }
        }
        if full {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Exponential moving average, smoothing factor `2 / (window + 1)`.
///
/// Seeded with the first observation and carries no bias adjustment, so it
/// is defined from row 0 onward.
pub fn ema(values: &[f64], window: usize) -> Vec<f64> {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Rolling sample standard deviation over a trailing window.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window as f64 - 1.0);
        out[i] = Some(var.sqrt());
    }
    out
}

/// Relative Strength Index over rolling mean gains/losses.
///
/// `100 - 100 / (1 + RS)` with `RS = mean(gains) / mean(losses)` over the
/// trailing `window` signed close deltas. Undefined while warming up and
/// whenever the mean loss is zero.
pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() < window + 1 {
        return out;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    for i in window..closes.len() {
        let slice = &deltas[i - window..i];
        let mut gains = 0.0;
        let mut losses = 0.0;
        for &d in slice {
            if d > 0.0 {
                gains += d;
            } else {
                losses -= d;
            }
        }
        let mean_gain = gains / window as f64;
        let mean_loss = losses / window as f64;
        if mean_loss == 0.0 {
            continue;
        }
        let rs = mean_gain / mean_loss;
        out[i] = Some(100.0 - 100.0 / (1.0 + rs));
    }
    out
}

/// True range per bar: `max(high - low, |high - prev_close|, |low - prev_close|)`.
///
/// The first bar has no previous close and falls back to `high - low`.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            if i == 0 {
                b.high - b.low
            } else {
                let prev_close = bars[i - 1].close;
                (b.high - b.low)
                    .max((b.high - prev_close).abs())
                    .max((b.low - prev_close).abs())
            }
        })
        .collect()
}

/// Average True Range: rolling mean of [`true_range`].
pub fn atr(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    sma(&true_range(bars), window)
}

/// Stochastic oscillator fast line.
///
/// `100 * (close - min(low)) / (max(high) - min(low))` over the trailing
/// window. Undefined while warming up and when the rolling range is zero.
pub fn stochastic_k(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if window == 0 {
        return out;
    }
    for i in (window - 1)..bars.len() {
        let slice = &bars[i + 1 - window..=i];
        let lowest = slice.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = slice.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;
        if range == 0.0 {
            continue;
        }
        out[i] = Some(100.0 * (bars[i].close - lowest) / range);
    }
    out
}

/// On-Balance Volume: cumulative volume signed by the close-to-close
/// direction. Starts at 0 and ignores unchanged closes.
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut acc = 0.0;
    for (i, b) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if b.close > prev_close {
                acc += b.volume;
            } else if b.close < prev_close {
                acc -= b.volume;
            }
        }
        out.push(acc);
    }
    out
}

/// Append all derived columns to an ordered bar series.
pub fn enrich(bars: &[Bar], params: &IndicatorParams) -> Vec<IndicatorRow> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let sma_short = sma(&closes, params.sma_short);
    let sma_long = sma(&closes, params.sma_long);
    let ema_short = ema(&closes, params.ema_short);
    let ema_long = ema(&closes, params.ema_long);
    let rsi_col = rsi(&closes, params.rsi_window);

    let ema_fast = ema(&closes, params.macd_fast);
    let ema_slow = ema(&closes, params.macd_slow);
    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd, params.macd_signal);

    let bollinger_sma = sma(&closes, params.bollinger_window);
    let bollinger_std = rolling_std(&closes, params.bollinger_window);

    let atr_col = atr(bars, params.atr_window);
    let percent_k = stochastic_k(bars, params.stochastic_window);
    let percent_d = sma_opt(&percent_k, params.stochastic_smooth);
    let obv_col = obv(bars);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let band = bollinger_sma[i].zip(bollinger_std[i]);
            IndicatorRow {
                bar: *bar,
                sma_7: sma_short[i],
                sma_14: sma_long[i],
                ema_7: ema_short[i],
                ema_14: ema_long[i],
                rsi: rsi_col[i],
                macd: macd[i],
                signal_line: signal_line[i],
                bollinger_sma: bollinger_sma[i],
                upper_band_bb: band.map(|(m, s)| m + params.bollinger_num_std * s),
                lower_band_bb: band.map(|(m, s)| m - params.bollinger_num_std * s),
                atr: atr_col[i],
                percent_k: percent_k[i],
                percent_d: percent_d[i],
                obv: obv_col[i],
            }
        })
        .collect()
}
