//! Run the forecasting pipeline for one or more symbols
//!
//! Usage: cargo run --bin run_pipeline -- --symbol MSFT --symbol RY.TO
//!        cargo run --bin run_pipeline -- --market canadian-etfs --offline

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use stock_forecast::api::{CsvSource, MarketDataSource, YahooClient};
use stock_forecast::config::Config;
use stock_forecast::data::Symbol;
use stock_forecast::pipeline::Pipeline;
use stock_forecast::universe::Market;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MarketArg {
    Us,
    CanadianStocks,
    IndianStocks,
    CanadianEtfs,
}

impl From<MarketArg> for Market {
    fn from(arg: MarketArg) -> Self {
        match arg {
            MarketArg::Us => Market::UsStocks,
            MarketArg::CanadianStocks => Market::CanadianStocks,
            MarketArg::IndianStocks => Market::IndianStocks,
            MarketArg::CanadianEtfs => Market::CanadianEtfs,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Fit, evaluate and interpret next-day return forecasts")]
struct Args {
    /// Ticker symbol (repeatable)
    #[arg(short, long)]
    symbol: Vec<String>,

    /// Run every symbol of a market
    #[arg(short, long, value_enum)]
    market: Option<MarketArg>,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// First day of history (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Price cache directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Artifact directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Replay cached prices instead of downloading
    #[arg(long)]
    offline: bool,

    /// Number of trees
    #[arg(short, long)]
    trees: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// List the available markets and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(start) = self.start {
            config.data.start_date = start;
        }
        if let Some(dir) = &self.data_dir {
            config.data.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.offline {
            config.data.offline = true;
        }
        if let Some(trees) = self.trees {
            config.model.n_trees = trees;
        }
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
    }

    fn symbols(&self) -> Result<Vec<Symbol>> {
        let mut symbols = Vec::new();
        if let Some(market) = self.market {
            symbols.extend(Market::from(market).symbols()?);
        }
        for s in &self.symbol {
            let symbol = Symbol::new(s)?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        if symbols.is_empty() {
            anyhow::bail!("no symbols given; use --symbol or --market");
        }
        Ok(symbols)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stock_forecast={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.list {
        for market in Market::ALL {
            println!("{}: {}", market, market.tickers().join(", "));
        }
        return Ok(());
    }

    let symbols = args.symbols()?;

    println!("===========================================");
    println!("  Stock Forecast Pipeline");
    println!("===========================================\n");

    let failed = if config.data.offline {
        let source = CsvSource::new(config.data.data_dir.clone());
        run(source, config, &symbols).await?
    } else {
        run(YahooClient::new(), config, &symbols).await?
    };

    if failed > 0 {
        anyhow::bail!("{} of {} runs failed", failed, symbols.len());
    }
    Ok(())
}

async fn run<S: MarketDataSource + 'static>(
    source: S,
    config: Config,
    symbols: &[Symbol],
) -> Result<usize> {
    info!(
        symbols = symbols.len(),
        trees = config.model.n_trees,
        seed = config.model.seed,
        "starting pipeline"
    );

    let output_dir = config.output.dir.clone();
    let pipeline = Arc::new(Pipeline::new(source, config));
    let results = pipeline.run_all(symbols).await;

    let mut failed = 0;
    for (symbol, result) in results {
        match result {
            Ok(report) => {
                let m = &report.metrics;
                let i = &report.interpretation;
                println!("{} ({})", symbol, report.artifacts.info.company);
                println!(
                    "  rows: {} (train {}, eval {})",
                    report.rows, report.train_size, report.eval_size
                );
                println!(
                    "  MAE: {:.5}  R²: {:.4}  directional accuracy: {:.1}%",
                    m.mean_absolute_error,
                    m.r_squared,
                    m.directional_accuracy * 100.0
                );
                println!(
                    "  outlook: {}  confidence: {}/100 ({})",
                    i.outlook,
                    i.confidence,
                    i.band().caption()
                );
                if let Some(top) = report.artifacts.importances.first() {
                    println!("  top feature: {} ({:.3})", top.feature, top.importance);
                }
                println!();
            }
            Err(err) => {
                failed += 1;
                println!("{}: FAILED at {} stage: {}\n", symbol, err.stage, err.source);
            }
        }
    }

    println!(
        "Artifacts written to {}",
        std::fs::canonicalize(&output_dir)
            .unwrap_or(output_dir)
            .display()
    );

    Ok(failed)
}
