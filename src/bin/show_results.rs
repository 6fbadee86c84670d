//! Show the stored results of earlier runs
//!
//! Usage: cargo run --bin show_results -- --symbol MSFT

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use stock_forecast::config::Config;
use stock_forecast::data::{DataLoader, PriceSeries, Symbol};
use stock_forecast::interpretation::{turning_points, Interpretation, TurningKind};
use stock_forecast::pipeline::{ArtifactStore, Artifacts, RunState};
use stock_forecast::universe::Market;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Display stored forecast results")]
struct Args {
    /// Ticker symbol (repeatable)
    #[arg(short, long, required = true)]
    symbol: Vec<String>,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Price cache directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Artifact directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of recent turning points to list
    #[arg(long, default_value = "5")]
    points: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stock_forecast=warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config)?;
    if let Some(dir) = &args.data_dir {
        config.data.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }

    let store = ArtifactStore::new(config.output.dir.clone());

    for s in &args.symbol {
        let symbol = Symbol::new(s)?;
        let market = Market::of(&symbol)
            .map(|m| m.label())
            .unwrap_or("Other");
        println!("=== {} [{}] ===", symbol, market);

        match store.load(&symbol)? {
            RunState::NeverRun => println!("No results yet. Run the pipeline first."),
            RunState::Failed { stage, error } => match stage {
                Some(stage) => println!("Last run failed at the {} stage: {}", stage, error),
                None => println!("Last run failed: {}", error),
            },
            RunState::Interrupted { error } => {
                println!("Last run was interrupted while saving; results may be inconsistent.");
                if let Some(error) = error {
                    println!("Cause: {}", error);
                }
            }
            RunState::Malformed(reason) => println!("Stored results are unreadable: {}", reason),
            RunState::Succeeded(artifacts) => show(&config, &symbol, &artifacts, args.points)?,
        }
        println!();
    }

    Ok(())
}

fn show(config: &Config, symbol: &Symbol, artifacts: &Artifacts, points: usize) -> Result<()> {
    let info = &artifacts.info;
    let metrics = &artifacts.metrics;

    println!("{} ({})", info.company, info.symbol);
    println!("Last close: {:.2} on {}", info.last_close, info.last_date);
    println!();
    println!("Model performance");
    println!("  MAE:                  {:.5}", metrics.mae);
    println!("  R²:                   {:.4}", metrics.r2);
    println!(
        "  Directional accuracy: {:.1}%",
        metrics.directional_accuracy * 100.0
    );

    println!();
    println!("Feature importance");
    for fi in &artifacts.importances {
        let bar = "#".repeat((fi.importance * 40.0).round() as usize);
        println!("  {:<14} {:>6.3} {}", fi.feature, fi.importance, bar);
    }

    let path = DataLoader::cache_path(&config.data.data_dir, symbol);
    let loaded =
        DataLoader::load_bars(&path).and_then(|bars| PriceSeries::new(symbol.clone(), bars));
    let series = match loaded {
        Ok(series) => series,
        Err(e) => {
            println!();
            println!("Price history unavailable ({}): {}", path.display(), e);
            return Ok(());
        }
    };

    println!();
    match Interpretation::from_series(&series, metrics.directional_accuracy) {
        Ok(interpretation) => {
            println!("Outlook: {}", interpretation.outlook.headline());
            println!(
                "Latest daily return: {:+.2}%  Recent volatility: {:.2}%",
                interpretation.recent_return * 100.0,
                interpretation.volatility * 100.0
            );
            println!(
                "Confidence: {}/100 - {}",
                interpretation.confidence,
                interpretation.band().caption()
            );
        }
        Err(e) => println!("Outlook unavailable: {}", e),
    }

    let turns = turning_points(&series);
    if !turns.is_empty() && points > 0 {
        println!();
        println!("Recent turning points");
        for tp in turns.iter().rev().take(points).rev() {
            let kind = match tp.kind {
                TurningKind::Peak => "peak",
                TurningKind::Drop => "drop",
            };
            println!("  {}  {:<4}  {:.2}", tp.date, kind, tp.close);
        }
    }

    Ok(())
}
