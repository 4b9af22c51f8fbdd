//! Batch orchestration: one incremental engine invocation per ticker.
//!
//! Tickers run in parallel on the rayon pool. Each ticker loads its own bars
//! and locks its own history files, so nothing is shared between workers.
//! A failing ticker is reported and never aborts the others.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use siglab_core::{
    BarSeries, EngineError, EngineWarning, IncrementalOutcome, IncrementalProcessor,
    SignalEngine, SignalType,
};

use crate::compare::ActionCounts;
use crate::config::{ConfigError, SiglabConfig};
use crate::data_loader::{csv_path, load_csv, LoadError};
use crate::store::JsonlSignalStore;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<siglab_core::ConfigError> for RunError {
    fn from(e: siglab_core::ConfigError) -> Self {
        Self::Config(ConfigError::Engine(e))
    }
}

/// Supplies one ticker's bars.
pub trait BarSource: Sync {
    fn load(&self, ticker: &str) -> Result<BarSeries, LoadError>;
}

/// `{dir}/{TICKER}.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BarSource for CsvDirSource {
    fn load(&self, ticker: &str) -> Result<BarSeries, LoadError> {
        load_csv(&csv_path(&self.dir, ticker)?, ticker)
    }
}

/// Result for one signal type of one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct SignalTypeReport {
    pub signal_type: SignalType,
    pub up_to_date: bool,
    pub new_signals: usize,
    pub counts: ActionCounts,
    pub written: usize,
    /// Action of the newest signal after this run.
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub bars: usize,
    pub signal_types: Vec<SignalTypeReport>,
    pub warnings: Vec<EngineWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Ok(TickerReport),
    Failed(TickerFailure),
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            Self::Ok(r) => &r.ticker,
            Self::Failed(f) => &f.ticker,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub config_fingerprint: String,
    /// Sorted by ticker.
    pub tickers: Vec<TickerOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &TickerFailure> {
        self.tickers.iter().filter_map(|t| match t {
            TickerOutcome::Failed(f) => Some(f),
            TickerOutcome::Ok(_) => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.tickers
            .iter()
            .filter(|t| matches!(t, TickerOutcome::Ok(_)))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Incremental run for one ticker, every configured signal type.
///
/// Each signal type holds its store lock from the last-signal lookup through
/// the write.
pub fn run_ticker(
    ticker: &str,
    source: &dyn BarSource,
    store: &JsonlSignalStore,
    processor: &IncrementalProcessor,
) -> Result<TickerReport, RunError> {
    let series = source.load(ticker)?;
    let mut reports = Vec::new();
    let mut warnings = Vec::new();

    for &signal_type in processor.engine().config().emission.signal_types() {
        let mut session = store
            .session(ticker, signal_type)
            .map_err(EngineError::HistoryLookup)?;
        let (outcome, summary) = processor.process_and_store(&series, signal_type, &mut session)?;

        if let Some(run) = outcome.run() {
            for w in &run.warnings {
                if !warnings.contains(w) {
                    warnings.push(w.clone());
                }
            }
        }
        reports.push(SignalTypeReport {
            signal_type,
            up_to_date: matches!(outcome, IncrementalOutcome::UpToDate { .. }),
            new_signals: outcome.new_signals().len(),
            counts: ActionCounts::from_signals(outcome.new_signals()),
            written: summary.written(),
            latest: outcome.latest().map(|s| s.signal.to_string()),
        });
    }

    Ok(TickerReport {
        ticker: ticker.to_string(),
        bars: series.len(),
        signal_types: reports,
        warnings,
    })
}

/// Run every ticker in parallel and collect a per-ticker report.
pub fn run_batch(
    config: &SiglabConfig,
    tickers: &[String],
    source: &dyn BarSource,
) -> Result<BatchReport, RunError> {
    let engine = SignalEngine::new(config.engine.clone())?;
    let processor = IncrementalProcessor::new(engine);
    let store = JsonlSignalStore::new(&config.data.store_dir);

    info!(
        tickers = tickers.len(),
        fingerprint = %config.engine.fingerprint(),
        "batch started"
    );

    let mut outcomes: Vec<TickerOutcome> = tickers
        .par_iter()
        .map(|ticker| match run_ticker(ticker, source, &store, &processor) {
            Ok(report) => TickerOutcome::Ok(report),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "ticker failed");
                TickerOutcome::Failed(TickerFailure {
                    ticker: ticker.clone(),
                    error: e.to_string(),
                })
            }
        })
        .collect();
    outcomes.sort_by(|a, b| a.ticker().cmp(b.ticker()));

    let report = BatchReport {
        config_fingerprint: config.engine.fingerprint(),
        tickers: outcomes,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failures().count(),
        "batch finished"
    );
    Ok(report)
}
