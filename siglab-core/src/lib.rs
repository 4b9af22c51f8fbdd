//! SigLab Core: moving-average crossover signal engine.
//!
//! This crate turns a per-ticker OHLCV bar series into BUY / SELL / STAY
//! signals:
//! - Bar ingestion and validation (schema resolution, cleaning, Polars adapter)
//! - Moving averages, confidence and peak-zone detection
//! - Fixed and adaptive (z-score, quantile) threshold policies
//! - Per-bar classification with reasoning text
//! - Incremental processing against a signal-history store

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod history;
pub mod incremental;
pub mod indicators;
pub mod signals;
pub mod threshold;

pub use data::BarSeries;
pub use domain::{Bar, Signal, SignalAction, SignalType};
pub use engine::{DerivedBar, Emission, EngineConfig, EngineRun, SignalEngine};
pub use error::{ConfigError, EngineError, EngineWarning};
pub use history::{HistoryError, MemoryHistory, SignalHistory, UpsertSummary};
pub use incremental::{IncrementalOutcome, IncrementalProcessor};
pub use threshold::{ThresholdMethod, ThresholdPolicy};
