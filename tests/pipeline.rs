//! End-to-end runs against an in-memory market data source

use chrono::{Duration, NaiveDate};
use std::path::Path;
use stock_forecast::api::{CsvSource, MarketDataSource, MemorySource};
use stock_forecast::config::Config;
use stock_forecast::data::{DataLoader, PriceBar, Symbol};
use stock_forecast::features::FEATURE_NAMES;
use stock_forecast::models::ForestConfig;
use stock_forecast::pipeline::{ArtifactStore, Pipeline, RunState, Stage};

fn fixed_bars(n: usize) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.7).sin() * 4.0 + (i as f64 * 0.19).cos() * 2.5;
            PriceBar::new(
                start + Duration::days(i as i64),
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                1_000_000 + i as u64 * 10,
            )
        })
        .collect()
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.data.data_dir = root.join("data");
    config.output.dir = root.join("outputs");
    config.model = ForestConfig {
        n_trees: 50,
        ..Default::default()
    };
    config
}

fn read_artifacts<S: MarketDataSource>(pipeline: &Pipeline<S>, symbol: &Symbol) -> Vec<Vec<u8>> {
    let store = pipeline.store();
    [
        store.metrics_path(symbol),
        store.importance_path(symbol),
        store.info_path(symbol),
    ]
    .iter()
    .map(|p| std::fs::read(p).unwrap())
    .collect()
}

#[tokio::test]
async fn test_sixty_bar_run() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("MSFT").unwrap();
    let bars = fixed_bars(60);
    let last_close = bars[59].close;

    let source = MemorySource::new().with_bars(symbol.clone(), bars);
    let pipeline = Pipeline::new(source, test_config(dir.path()));

    let report = pipeline.run(&symbol).await.unwrap();

    let accuracy = report.metrics.directional_accuracy;
    assert!((0.0..=1.0).contains(&accuracy));
    assert!(report.interpretation.confidence <= 100);

    let importances = &report.artifacts.importances;
    assert_eq!(importances.len(), FEATURE_NAMES.len());
    for name in FEATURE_NAMES {
        assert!(importances.iter().any(|fi| fi.feature == name));
    }
    let total: f64 = importances.iter().map(|fi| fi.importance).sum();
    assert!(total > 0.0);

    assert_eq!(report.artifacts.info.last_close, last_close);
    assert_eq!(report.artifacts.info.last_date, "2024-02-29");

    match pipeline.store().load(&symbol).unwrap() {
        RunState::Succeeded(stored) => assert_eq!(stored, report.artifacts),
        other => panic!("unexpected state: {:?}", other),
    }

    // Raw prices are cached for consumers
    let cache = DataLoader::cache_path(&dir.path().join("data"), &symbol);
    let cached = DataLoader::load_bars(cache).unwrap();
    assert_eq!(cached.len(), 60);
}

#[tokio::test]
async fn test_reruns_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("RY.TO").unwrap();
    let source = MemorySource::new().with_bars(symbol.clone(), fixed_bars(80));
    let pipeline = Pipeline::new(source, test_config(dir.path()));

    pipeline.run(&symbol).await.unwrap();
    let first = read_artifacts(&pipeline, &symbol);

    pipeline.run(&symbol).await.unwrap();
    let second = read_artifacts(&pipeline, &symbol);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_run_writes_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("TSLA").unwrap();
    let source = MemorySource::new().with_bars(symbol.clone(), fixed_bars(15));
    let pipeline = Pipeline::new(source, test_config(dir.path()));

    assert_eq!(pipeline.store().load(&symbol).unwrap(), RunState::NeverRun);

    let err = pipeline.run(&symbol).await.unwrap_err();
    assert_eq!(err.stage, Stage::Features);
    assert_eq!(err.symbol, symbol);

    let store = pipeline.store();
    assert!(!store.metrics_path(&symbol).exists());
    assert!(!store.importance_path(&symbol).exists());
    assert!(!store.info_path(&symbol).exists());
    assert!(matches!(
        store.load(&symbol).unwrap(),
        RunState::Failed { stage: Some(Stage::Features), .. }
    ));
}

#[tokio::test]
async fn test_offline_replay_matches_live_run() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("XIU.TO").unwrap();

    let live = Pipeline::new(
        MemorySource::new().with_bars(symbol.clone(), fixed_bars(70)),
        test_config(dir.path()),
    );
    let live_report = live.run(&symbol).await.unwrap();

    let mut offline_config = test_config(dir.path());
    offline_config.data.offline = true;
    offline_config.output.dir = dir.path().join("replay");
    let offline = Pipeline::new(CsvSource::new(dir.path().join("data")), offline_config);
    let offline_report = offline.run(&symbol).await.unwrap();

    assert_eq!(live_report.artifacts, offline_report.artifacts);
}

#[tokio::test]
async fn test_run_pipeline_offline_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("ENB").unwrap();

    seed_price_cache(&dir.path().join("data"), &symbol, 60);

    let mut config = test_config(dir.path());
    config.data.offline = true;

    let report = stock_forecast::run_pipeline(&symbol, config).await.unwrap();
    assert_eq!(report.rows, 49);

    let missing = Symbol::new("CNQ").unwrap();
    let mut config = test_config(dir.path());
    config.data.offline = true;
    let err = stock_forecast::run_pipeline(&missing, config).await.unwrap_err();
    assert_eq!(err.stage, Stage::Fetch);
}

fn seed_price_cache(data_dir: &Path, symbol: &Symbol, n: usize) {
    std::fs::create_dir_all(data_dir).unwrap();
    let file = std::fs::File::create(DataLoader::cache_path(data_dir, symbol)).unwrap();
    DataLoader::write_bars(&fixed_bars(n), file).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_for_one_symbol_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("SHOP.TO").unwrap();
    seed_price_cache(&dir.path().join("data"), &symbol, 60);

    for _ in 0..20 {
        let runs: Vec<_> = [1u64, 2]
            .into_iter()
            .map(|seed| {
                let mut config = test_config(dir.path());
                config.data.offline = true;
                config.model.n_trees = 10;
                config.model.seed = seed;
                let symbol = symbol.clone();
                tokio::spawn(async move { stock_forecast::run_pipeline(&symbol, config).await })
            })
            .collect();

        let mut reports = Vec::new();
        for run in runs {
            reports.push(run.await.unwrap().unwrap());
        }

        let store = ArtifactStore::new(dir.path().join("outputs"));
        match store.load(&symbol).unwrap() {
            RunState::Succeeded(stored) => {
                assert!(reports.iter().any(|r| r.artifacts == stored));
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    let leftovers = std::fs::read_dir(dir.path().join("outputs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_waits_for_directory_lock() {
    let dir = tempfile::tempdir().unwrap();
    let symbol = Symbol::new("BNS.TO").unwrap();
    seed_price_cache(&dir.path().join("data"), &symbol, 60);

    let mut config = test_config(dir.path());
    config.data.offline = true;
    config.model.n_trees = 10;

    // Stands in for another process working on the same symbol
    let store = ArtifactStore::new(config.output.dir.clone());
    let held = store.lock(&symbol).unwrap();

    let run = {
        let symbol = symbol.clone();
        tokio::spawn(async move { stock_forecast::run_pipeline(&symbol, config).await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!run.is_finished());
    assert_eq!(store.load(&symbol).unwrap(), RunState::NeverRun);

    drop(held);
    let report = tokio::time::timeout(std::time::Duration::from_secs(30), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(report.rows, 49);
    assert!(matches!(store.load(&symbol).unwrap(), RunState::Succeeded(_)));
}
