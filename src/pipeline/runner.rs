//! Pipeline orchestration
//!
//! A run fetches the raw series, refreshes the price cache, builds features,
//! fits the forest, evaluates it, interprets the outcome and finally commits
//! the artifact set. The first failing stage ends the run and is recorded in
//! the symbol's status file; no artifact is touched in that case.

use super::artifacts::{
    write_price_history, ArtifactStore, Artifacts, MetricsRecord, StockInfoRecord,
};
use super::gate::RunGate;
use super::stage::{PipelineError, Stage, StageContext};
use crate::api::{CsvSource, MarketDataSource, YahooClient};
use crate::config::Config;
use crate::data::{PriceSeries, Symbol};
use crate::error::Error;
use crate::evaluation::{evaluate, Metrics};
use crate::features::FeatureBuilder;
use crate::interpretation::Interpretation;
use crate::models::ForecastModel;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub symbol: Symbol,
    pub metrics: Metrics,
    pub interpretation: Interpretation,
    pub artifacts: Artifacts,
    /// Usable feature rows
    pub rows: usize,
    pub train_size: usize,
    pub eval_size: usize,
}

/// Drives runs against one market data source and one artifact directory
pub struct Pipeline<S> {
    source: S,
    config: Config,
    store: ArtifactStore,
    gate: &'static RunGate,
}

impl<S: MarketDataSource> Pipeline<S> {
    pub fn new(source: S, config: Config) -> Self {
        let store = ArtifactStore::new(config.output.dir.clone());
        Self {
            source,
            config,
            store,
            gate: RunGate::shared(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run the whole pipeline for one symbol.
    ///
    /// Runs for the same symbol wait for each other, whether they come from
    /// this process or another one writing to the same artifact directory.
    /// Other symbols proceed independently. Failing to take the directory
    /// lock is reported as a persist failure.
    pub async fn run(&self, symbol: &Symbol) -> Result<RunReport, PipelineError> {
        let _guard = self.gate.acquire(symbol).await;

        let store = self.store.clone();
        let owned = symbol.clone();
        let _lock = spawn_worker(symbol, Stage::Persist, move || store.lock(&owned))
            .await?
            .stage(symbol, Stage::Persist)?;

        info!(symbol = %symbol, source = self.source.name(), "starting run");

        match self.execute(symbol).await {
            Ok(report) => {
                info!(
                    symbol = %symbol,
                    mae = report.metrics.mean_absolute_error,
                    r2 = report.metrics.r_squared,
                    directional_accuracy = report.metrics.directional_accuracy,
                    outlook = %report.interpretation.outlook,
                    confidence = report.interpretation.confidence,
                    "run succeeded"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(symbol = %symbol, stage = %err.stage, error = %err.source, "run failed");
                if let Err(e) = self
                    .store
                    .record_failure(symbol, err.stage, &err.source.to_string())
                {
                    warn!(symbol = %symbol, error = %e, "could not record run failure");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, symbol: &Symbol) -> Result<RunReport, PipelineError> {
        let series = self
            .source
            .fetch(symbol, self.config.data.start_date)
            .await
            .stage(symbol, Stage::Fetch)?;

        info!(
            symbol = %symbol,
            bars = series.len(),
            last = %series.last().date,
            "fetched price history"
        );

        if !self.config.data.offline {
            let dir = self.config.data.data_dir.clone();
            let cached = series.clone();
            spawn_worker(symbol, Stage::Cache, move || write_price_history(&dir, &cached))
                .await?
                .stage(symbol, Stage::Cache)?;
        }

        let config = self.config.clone();
        let report = spawn_worker(symbol, Stage::Fit, move || analyze(&series, &config)).await??;

        let store = self.store.clone();
        let artifacts = report.artifacts.clone();
        let owned = symbol.clone();
        spawn_worker(symbol, Stage::Persist, move || store.commit(&owned, &artifacts))
            .await?
            .stage(symbol, Stage::Persist)?;

        Ok(report)
    }
}

impl<S: MarketDataSource + 'static> Pipeline<S> {
    /// Run several symbols concurrently; one symbol's failure leaves the
    /// others untouched. Results come back in input order.
    pub async fn run_all(
        self: &Arc<Self>,
        symbols: &[Symbol],
    ) -> Vec<(Symbol, Result<RunReport, PipelineError>)> {
        let mut tasks = JoinSet::new();
        for (i, symbol) in symbols.iter().enumerate() {
            let pipeline = Arc::clone(self);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let result = pipeline.run(&symbol).await;
                (i, symbol, result)
            });
        }

        let mut results = Vec::with_capacity(symbols.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "run task aborted"),
            }
        }

        results.sort_by_key(|(i, _, _)| *i);
        results
            .into_iter()
            .map(|(_, symbol, result)| (symbol, result))
            .collect()
    }
}

/// Run one symbol with the configured data source: the Yahoo Finance client,
/// or the price cache when `data.offline` is set.
pub async fn run_pipeline(symbol: &Symbol, config: Config) -> Result<RunReport, PipelineError> {
    if config.data.offline {
        let source = CsvSource::new(config.data.data_dir.clone());
        Pipeline::new(source, config).run(symbol).await
    } else {
        Pipeline::new(YahooClient::new(), config).run(symbol).await
    }
}

/// Run a blocking job off the async executor
async fn spawn_worker<T, F>(symbol: &Symbol, stage: Stage, job: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| PipelineError::new(symbol, stage, Error::Worker(e.to_string())))
}

/// CPU-bound part of a run: features, fit, evaluation and interpretation.
///
/// Pure apart from logging, so the same series and configuration always
/// give the same report.
pub fn analyze(series: &PriceSeries, config: &Config) -> Result<RunReport, PipelineError> {
    let symbol = series.symbol();

    let rows = FeatureBuilder::new()
        .with_min_rows(config.split.min_rows)
        .build(series)
        .stage(symbol, Stage::Features)?;

    let forecast = ForecastModel::new(config.model.clone())
        .with_test_ratio(config.split.test_ratio)
        .fit_predict(&rows)
        .stage(symbol, Stage::Fit)?;

    let metrics = evaluate(&forecast.actual, &forecast.predicted).stage(symbol, Stage::Evaluate)?;

    let interpretation = Interpretation::from_series(series, metrics.directional_accuracy)
        .stage(symbol, Stage::Interpret)?;

    let last = series.last();
    let artifacts = Artifacts {
        metrics: MetricsRecord::from(metrics),
        importances: forecast.importances,
        info: StockInfoRecord {
            company: series.display_name().to_string(),
            symbol: symbol.to_string(),
            last_close: last.close,
            last_date: last.date.format("%Y-%m-%d").to_string(),
        },
    };

    Ok(RunReport {
        symbol: symbol.clone(),
        metrics,
        interpretation,
        artifacts,
        rows: rows.len(),
        train_size: forecast.train_size,
        eval_size: forecast.actual.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemorySource;
    use crate::data::bars_from_closes;
    use crate::models::ForestConfig;
    use crate::pipeline::RunState;

    fn closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 4.0 + i as f64 * 0.05)
            .collect()
    }

    fn config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.data.data_dir = root.join("data");
        config.output.dir = root.join("outputs");
        config.model = ForestConfig {
            n_trees: 25,
            ..Default::default()
        };
        config
    }

    #[test]
    fn test_analyze_fills_report() {
        let dir = tempfile::tempdir().unwrap();
        let series =
            PriceSeries::new(Symbol::new("MSFT").unwrap(), bars_from_closes(&closes(60))).unwrap();

        let report = analyze(&series, &config(dir.path())).unwrap();

        assert_eq!(report.rows, 49);
        assert_eq!(report.eval_size, 10);
        assert_eq!(report.train_size, 39);
        assert_eq!(report.artifacts.info.last_close, series.last().close);
        assert_eq!(report.artifacts.info.company, "MSFT");
        assert!(report.interpretation.confidence <= 100);
    }

    #[test]
    fn test_short_series_fails_at_features() {
        let dir = tempfile::tempdir().unwrap();
        let series =
            PriceSeries::new(Symbol::new("MSFT").unwrap(), bars_from_closes(&closes(15))).unwrap();

        let err = analyze(&series, &config(dir.path())).unwrap_err();
        assert_eq!(err.stage, Stage::Features);
        assert!(matches!(err.source, Error::DataInsufficient { rows: 4, required: 10 }));
    }

    #[tokio::test]
    async fn test_unknown_symbol_fails_at_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(MemorySource::new(), config(dir.path()));
        let symbol = Symbol::new("NOPE").unwrap();

        let err = pipeline.run(&symbol).await.unwrap_err();
        assert_eq!(err.stage, Stage::Fetch);
        assert!(err.source.is_fetch_error());

        assert!(matches!(
            pipeline.store().load(&symbol).unwrap(),
            RunState::Failed { stage: Some(Stage::Fetch), .. }
        ));
    }

    #[tokio::test]
    async fn test_run_all_keeps_failures_per_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let good = Symbol::new("MSFT").unwrap();
        let short = Symbol::new("AAPL").unwrap();
        let source = MemorySource::new()
            .with_bars(good.clone(), bars_from_closes(&closes(60)))
            .with_bars(short.clone(), bars_from_closes(&closes(12)));

        let pipeline = Arc::new(Pipeline::new(source, config(dir.path())));
        let results = pipeline.run_all(&[good.clone(), short.clone()]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, good);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, short);
        assert!(results[1].1.is_err());

        assert!(matches!(pipeline.store().load(&good).unwrap(), RunState::Succeeded(_)));
        assert!(!pipeline.store().metrics_path(&short).exists());
    }
}
