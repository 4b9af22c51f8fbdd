//! SigLab Runner: batch orchestration, persistence, configuration.
//!
//! This crate builds on `siglab-core` to provide:
//! - TOML configuration (`[engine]`, `[data]`, tickers)
//! - CSV bar loading with provider header aliases
//! - JSONL signal history with per-file writer locks
//! - Parallel per-ticker batch runs with isolated failures
//! - Fixed vs adaptive policy comparison
//! - Seeded bar simulation

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod runner;
pub mod simulator;
pub mod store;

pub use compare::{compare_policies, ActionCounts, PolicyComparison};
pub use config::{is_safe_ticker, ConfigError, DataConfig, SiglabConfig};
pub use data_loader::{csv_path, load_csv, parse_csv, write_csv, LoadError};
pub use runner::{
    run_batch, run_ticker, BarSource, BatchReport, CsvDirSource, RunError, TickerOutcome,
    TickerReport,
};
pub use simulator::{BarSimulator, SimulatorError};
pub use store::{JsonlSignalStore, LockedSession, StoreLock};
