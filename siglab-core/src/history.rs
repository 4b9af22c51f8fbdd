//! Signal-history contract.
//!
//! The engine resumes from the most recent persisted signal per
//! `(ticker, signal_type)` and hands back new signals for upsert. Storage
//! layout is the implementor's business.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{Signal, SignalType};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("signal history I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt signal record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("signal history for {ticker}/{signal_type} is locked by another writer")]
    Locked {
        ticker: String,
        signal_type: SignalType,
    },

    #[error("signal serialization: {0}")]
    Serialization(String),

    #[error("ticker '{ticker}' cannot name a history file")]
    InvalidTicker { ticker: String },
}

/// Counts returned by [`SignalHistory::upsert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Identical signal already present: no-op.
    pub unchanged: usize,
}

impl UpsertSummary {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

impl std::ops::AddAssign for UpsertSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.updated += rhs.updated;
        self.unchanged += rhs.unchanged;
    }
}

/// Persisted signals keyed uniquely by `(ticker, signal_type, timestamp)`.
pub trait SignalHistory {
    /// Most recent signal, `None` on cold start.
    fn last_signal(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<Option<Signal>, HistoryError>;

    fn last_signal_timestamp(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<Option<NaiveDateTime>, HistoryError> {
        Ok(self.last_signal(ticker, signal_type)?.map(|s| s.timestamp))
    }

    /// Insert or replace by key. Re-submitting an identical signal is a no-op.
    fn upsert(&mut self, signals: &[Signal]) -> Result<UpsertSummary, HistoryError>;

    /// Up to `limit` most recent signals, oldest first.
    fn recent(
        &self,
        ticker: &str,
        signal_type: SignalType,
        limit: usize,
    ) -> Result<Vec<Signal>, HistoryError>;
}

type Key = (String, SignalType, NaiveDateTime);

/// In-process history. Useful for tests and single-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    signals: BTreeMap<Key, Signal>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    fn range(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> impl DoubleEndedIterator<Item = &Signal> {
        let lo = (ticker.to_string(), signal_type, NaiveDateTime::MIN);
        let hi = (ticker.to_string(), signal_type, NaiveDateTime::MAX);
        self.signals.range(lo..=hi).map(|(_, s)| s)
    }
}

/// Shared upsert rule for map-backed histories.
pub fn upsert_into(
    map: &mut BTreeMap<NaiveDateTime, Signal>,
    signals: impl IntoIterator<Item = Signal>,
) -> UpsertSummary {
    let mut summary = UpsertSummary::default();
    for signal in signals {
        match map.get(&signal.timestamp) {
            Some(existing) if *existing == signal => summary.unchanged += 1,
            Some(_) => {
                summary.updated += 1;
                map.insert(signal.timestamp, signal);
            }
            None => {
                summary.inserted += 1;
                map.insert(signal.timestamp, signal);
            }
        }
    }
    summary
}

impl SignalHistory for MemoryHistory {
    fn last_signal(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<Option<Signal>, HistoryError> {
        Ok(self.range(ticker, signal_type).next_back().cloned())
    }

    fn upsert(&mut self, signals: &[Signal]) -> Result<UpsertSummary, HistoryError> {
        let mut summary = UpsertSummary::default();
        for signal in signals {
            let key = (signal.ticker.clone(), signal.signal_type, signal.timestamp);
            match self.signals.get(&key) {
                Some(existing) if existing == signal => summary.unchanged += 1,
                Some(_) => {
                    summary.updated += 1;
                    self.signals.insert(key, signal.clone());
                }
                None => {
                    summary.inserted += 1;
                    self.signals.insert(key, signal.clone());
                }
            }
        }
        Ok(summary)
    }

    fn recent(
        &self,
        ticker: &str,
        signal_type: SignalType,
        limit: usize,
    ) -> Result<Vec<Signal>, HistoryError> {
        let mut out: Vec<Signal> = self
            .range(ticker, signal_type)
            .rev()
            .take(limit)
            .cloned()
            .collect();
        out.reverse();
        Ok(out)
    }
}
