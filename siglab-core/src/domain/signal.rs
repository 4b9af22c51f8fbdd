//! Signal: the persisted engine output.
//!
//! A `Signal` is immutable once emitted. Recomputing the same bar with the same
//! inputs reproduces the same value, which is what makes upserts idempotent.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Stay,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Stay => "STAY",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which threshold family produced a signal.
///
/// Part of the uniqueness key: the same bar may carry one signal per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    /// Fixed confidence threshold.
    MaFixed,
    /// Adaptive (z-score or quantile) confidence threshold.
    MaDynamic,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaFixed => "ma_fixed",
            Self::MaDynamic => "ma_dynamic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ma_fixed" => Some(Self::MaFixed),
            "ma_dynamic" => Some(Self::MaDynamic),
            _ => None,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted signal. Unique per `(ticker, timestamp, signal_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub timestamp: NaiveDateTime,
    pub signal: SignalAction,
    pub signal_type: SignalType,
    pub confidence: f64,
    pub threshold_used: f64,
    pub reasoning: String,
}

impl Signal {
    /// The uniqueness key used by signal-history stores.
    pub fn key(&self) -> (&str, SignalType, NaiveDateTime) {
        (&self.ticker, self.signal_type, self.timestamp)
    }
}
