//! Engine error and warning taxonomy.
//!
//! Errors abort the invocation for one ticker. Warnings never do: they are
//! returned alongside the result so the caller can report them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::HistoryError;

/// Errors surfaced by a single engine invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error in field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("no usable bars for '{ticker}' after cleaning")]
    EmptySeries { ticker: String },

    #[error("signal history lookup failed: {0}")]
    HistoryLookup(#[source] HistoryError),

    #[error("signal history write failed: {0}")]
    HistoryWrite(#[source] HistoryError),

    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Rejected engine parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1")]
    ZeroWindow { name: &'static str },

    #[error("short_window ({short}) must be < long_window ({long})")]
    WindowOrder { short: usize, long: usize },

    #[error("{name} must be in {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: f64,
    },
}

/// Non-fatal conditions reported with every engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// The series was too short for the configured windows, so both moving
    /// average windows were scaled down.
    InsufficientData {
        bars: usize,
        requested_short: usize,
        requested_long: usize,
        effective_short: usize,
        effective_long: usize,
    },
    /// Bars whose long moving average was zero or whose confidence was not
    /// finite; their confidence was forced to 0.
    DegenerateInput { bars: usize },
}

impl std::fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData {
                bars,
                requested_short,
                requested_long,
                effective_short,
                effective_long,
            } => write!(
                f,
                "only {bars} bars: windows rescaled from {requested_short}/{requested_long} \
                 to {effective_short}/{effective_long}"
            ),
            Self::DegenerateInput { bars } => {
                write!(f, "{bars} bars with zero long MA or non-finite confidence, forced to 0")
            }
        }
    }
}
