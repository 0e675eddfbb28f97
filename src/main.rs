//! coincast — Bitcoin daily high/low forecaster.

use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use coincast::{
    config::Config,
    cycle::PredictionCycle,
    data::{BarSource, CsvSentimentSource, YahooChartSource},
    indicators,
    pipeline::PricePredictor,
    store::PredictionStore,
    types::Interval,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coincast")]
#[command(about = "Daily high/low price forecasts from technical indicators and news sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one prediction cycle and persist the result
    Predict {
        /// Session date to predict (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run a cycle now, then once daily at the configured hour
    Watch,
    /// Show stored predictions
    History {
        /// Number of most recent records to show
        #[arg(short, long, default_value = "30")]
        limit: usize,
    },
    /// Compute and print the latest indicator rows
    Indicators {
        /// Bar interval
        #[arg(long, value_enum, default_value = "daily")]
        interval: IntervalArg,
        /// Number of trailing rows to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IntervalArg {
    Daily,
    Hourly,
}

impl From<IntervalArg> for Interval {
    fn from(arg: IntervalArg) -> Self {
        match arg {
            IntervalArg::Daily => Interval::Daily,
            IntervalArg::Hourly => Interval::Hourly,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Predict { date } => run_predict(config, date).await,
        Commands::Watch => run_watch(config).await,
        Commands::History { limit } => show_history(config, limit).await,
        Commands::Indicators { interval, limit } => {
            show_indicators(config, interval.into(), limit).await
        }
    }
}

async fn build_cycle(
    config: &Config,
) -> anyhow::Result<PredictionCycle<YahooChartSource, CsvSentimentSource>> {
    let predictor = Arc::new(PricePredictor::load(Path::new(&config.models.dir))?);
    let store = PredictionStore::connect(Path::new(&config.store.path)).await?;
    let bars = YahooChartSource::new(&config.market.base_url, &config.market.symbol)?;
    let sentiment = CsvSentimentSource::new(&config.sentiment.path);
    Ok(PredictionCycle::new(bars, sentiment, predictor, store, config))
}

async fn run_predict(config: Config, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let cycle = build_cycle(&config).await?;
    let session = date.unwrap_or_else(|| Local::now().date_naive());

    let report = cycle.run_for(session).await?;
    println!("\n📈 Prediction for {}\n", report.record.date);
    println!("Predicted High: ${:.2}", report.record.predicted_high);
    println!("Predicted Low:  ${:.2}", report.record.predicted_low);
    println!(
        "Features: market row {} + sentiment {} ({} match)",
        report.market_date, report.sentiment_date, report.tier
    );
    Ok(())
}

async fn run_watch(config: Config) -> anyhow::Result<()> {
    let hour = config.schedule.hour;
    let cycle = build_cycle(&config).await?;
    tracing::info!(hour, "watch mode started");

    loop {
        let session = Local::now().date_naive();
        match cycle.run_for(session).await {
            Ok(report) => {
                tracing::info!(
                    session = %report.record.date,
                    predicted_high = report.record.predicted_high,
                    predicted_low = report.record.predicted_low,
                    "daily prediction stored"
                );
            }
            // The failed cycle left no partial state; retry at the next tick.
            Err(e) => tracing::error!("cycle failed: {e}"),
        }

        let wait = until_next_run(hour);
        tracing::info!("next cycle in {}s", wait.as_secs());
        tokio::time::sleep(wait).await;
    }
}

fn until_next_run(hour: u32) -> Duration {
    let now = Local::now().naive_local();
    let run_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(run_time);
    if next <= now {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

async fn show_history(config: Config, limit: usize) -> anyhow::Result<()> {
    let store = PredictionStore::connect(Path::new(&config.store.path)).await?;
    let records = store.recent(limit).await?;

    if records.is_empty() {
        println!("No predictions stored yet.");
        return Ok(());
    }

    println!("\n📊 Stored Predictions\n");
    println!("{:<12} {:>15} {:>15}", "Date", "Predicted High", "Predicted Low");
    println!("{}", "-".repeat(44));
    for record in records {
        println!(
            "{:<12} {:>15.2} {:>15.2}",
            record.date.to_string(),
            record.predicted_high,
            record.predicted_low
        );
    }
    Ok(())
}

async fn show_indicators(config: Config, interval: Interval, limit: usize) -> anyhow::Result<()> {
    let source = YahooChartSource::new(&config.market.base_url, &config.market.symbol)?;
    let end = Local::now().date_naive();
    let start = match interval {
        Interval::Daily => config.market.history_start,
        Interval::Hourly => end
            .checked_sub_days(chrono::Days::new(config.market.hourly_days))
            .unwrap_or(end),
    };

    let bars = source.bars(start, end, interval).await?;
    let rows = indicators::enrich(&bars, &config.indicators);

    let fmt = |v: Option<f64>| match v {
        Some(x) => format!("{x:.2}"),
        None => "-".to_string(),
    };

    println!("\n📈 {} {} bars\n", config.market.symbol, interval);
    println!(
        "{:<17} {:>10} {:>10} {:>10} {:>8} {:>10} {:>10} {:>7} {:>7} {:>14}",
        "Time", "Close", "SMA7", "SMA14", "RSI", "MACD", "ATR", "%K", "%D", "OBV"
    );
    println!("{}", "-".repeat(110));
    for row in rows.iter().rev().take(limit).rev() {
        println!(
            "{:<17} {:>10.2} {:>10} {:>10} {:>8} {:>10.2} {:>10} {:>7} {:>7} {:>14.0}",
            row.bar.ts.format("%Y-%m-%d %H:%M").to_string(),
            row.bar.close,
            fmt(row.sma_7),
            fmt(row.sma_14),
            fmt(row.rsi),
            row.macd,
            fmt(row.atr),
            fmt(row.percent_k),
            fmt(row.percent_d),
            row.obv
        );
    }
    Ok(())
}
