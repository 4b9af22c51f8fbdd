//! JSONL signal store.
//!
//! One file per `(ticker, signal_type)` at `{root}/{TICKER}/{signal_type}.jsonl`,
//! one JSON object per line, ascending by timestamp. Upserts merge by
//! timestamp and rewrite the file atomically (write to .tmp, rename into place).
//!
//! Writers are serialized per file by a `{file}.lock` sentinel created with
//! `create_new`; it is removed when the guard drops. Readers take no lock.
//! [`JsonlSignalStore::session`] holds the lock across a whole
//! read, compute, write sequence.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::debug;

use siglab_core::history::upsert_into;
use siglab_core::{HistoryError, Signal, SignalHistory, SignalType, UpsertSummary};

use crate::config::is_safe_ticker;

#[derive(Debug, Clone)]
pub struct JsonlSignalStore {
    root: PathBuf,
}

/// Held writer lock on one history file.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl JsonlSignalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `{root}/{TICKER}/{signal_type}.jsonl`. The ticker must be a single
    /// path component.
    pub fn path_for(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<PathBuf, HistoryError> {
        if !is_safe_ticker(ticker) {
            return Err(HistoryError::InvalidTicker {
                ticker: ticker.to_string(),
            });
        }
        Ok(self
            .root
            .join(ticker)
            .join(format!("{}.jsonl", signal_type.as_str())))
    }

    fn lock_path(&self, ticker: &str, signal_type: SignalType) -> Result<PathBuf, HistoryError> {
        let mut p = self.path_for(ticker, signal_type)?.into_os_string();
        p.push(".lock");
        Ok(PathBuf::from(p))
    }

    /// Take the writer lock for `(ticker, signal_type)`.
    pub fn lock(&self, ticker: &str, signal_type: SignalType) -> Result<StoreLock, HistoryError> {
        let path = self.lock_path(ticker, signal_type)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                Ok(StoreLock { path })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(HistoryError::Locked {
                ticker: ticker.to_string(),
                signal_type,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored signal for the pair, keyed by timestamp.
    ///
    /// A missing file is an empty history. A malformed line is an error.
    pub fn read_all(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<BTreeMap<NaiveDateTime, Signal>, HistoryError> {
        let path = self.path_for(ticker, signal_type)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = BTreeMap::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let signal: Signal = serde_json::from_str(&line).map_err(|e| HistoryError::Corrupt {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            if signal.ticker != ticker || signal.signal_type != signal_type {
                return Err(HistoryError::Corrupt {
                    line: idx + 1,
                    reason: format!(
                        "record for {}/{} in {}/{} history",
                        signal.ticker, signal.signal_type, ticker, signal_type
                    ),
                });
            }
            out.insert(signal.timestamp, signal);
        }
        Ok(out)
    }

    fn write_all(
        &self,
        ticker: &str,
        signal_type: SignalType,
        signals: &BTreeMap<NaiveDateTime, Signal>,
    ) -> Result<(), HistoryError> {
        let path = self.path_for(ticker, signal_type)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("jsonl.tmp");

        {
            let mut file = io::BufWriter::new(File::create(&tmp_path)?);
            for signal in signals.values() {
                let json = serde_json::to_string(signal)
                    .map_err(|e| HistoryError::Serialization(e.to_string()))?;
                writeln!(file, "{json}")?;
            }
            file.flush()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Merge into the file. The caller holds the lock.
    fn merge(
        &self,
        ticker: &str,
        signal_type: SignalType,
        batch: Vec<Signal>,
    ) -> Result<UpsertSummary, HistoryError> {
        let mut existing = self.read_all(ticker, signal_type)?;
        let summary = upsert_into(&mut existing, batch);
        if summary.written() > 0 {
            self.write_all(ticker, signal_type, &existing)?;
        }
        debug!(
            ticker,
            signal_type = %signal_type,
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "signals upserted"
        );
        Ok(summary)
    }

    /// Lock `(ticker, signal_type)` until the session drops.
    pub fn session(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<LockedSession<'_>, HistoryError> {
        let lock = self.lock(ticker, signal_type)?;
        Ok(LockedSession {
            store: self,
            ticker: ticker.to_string(),
            signal_type,
            _lock: lock,
        })
    }

    /// Tickers that have a directory in the store.
    pub fn tickers(&self) -> Result<Vec<String>, HistoryError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                out.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        out.sort();
        Ok(out)
    }
}

impl SignalHistory for JsonlSignalStore {
    fn last_signal(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<Option<Signal>, HistoryError> {
        Ok(self
            .read_all(ticker, signal_type)?
            .into_values()
            .next_back())
    }

    fn upsert(&mut self, signals: &[Signal]) -> Result<UpsertSummary, HistoryError> {
        let mut groups: BTreeMap<(&str, SignalType), Vec<Signal>> = BTreeMap::new();
        for s in signals {
            groups
                .entry((s.ticker.as_str(), s.signal_type))
                .or_default()
                .push(s.clone());
        }

        let mut total = UpsertSummary::default();
        for ((ticker, signal_type), batch) in groups {
            let _lock = self.lock(ticker, signal_type)?;
            total += self.merge(ticker, signal_type, batch)?;
        }
        Ok(total)
    }

    fn recent(
        &self,
        ticker: &str,
        signal_type: SignalType,
        limit: usize,
    ) -> Result<Vec<Signal>, HistoryError> {
        let all = self.read_all(ticker, signal_type)?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_values().skip(skip).collect())
    }
}

/// Exclusive access to one `(ticker, signal_type)` history.
///
/// Writes for any other pair are rejected as [`HistoryError::Locked`].
#[derive(Debug)]
pub struct LockedSession<'a> {
    store: &'a JsonlSignalStore,
    ticker: String,
    signal_type: SignalType,
    _lock: StoreLock,
}

impl LockedSession<'_> {
    fn check(&self, ticker: &str, signal_type: SignalType) -> Result<(), HistoryError> {
        if ticker == self.ticker && signal_type == self.signal_type {
            Ok(())
        } else {
            Err(HistoryError::Locked {
                ticker: ticker.to_string(),
                signal_type,
            })
        }
    }
}

impl SignalHistory for LockedSession<'_> {
    fn last_signal(
        &self,
        ticker: &str,
        signal_type: SignalType,
    ) -> Result<Option<Signal>, HistoryError> {
        self.store.last_signal(ticker, signal_type)
    }

    fn upsert(&mut self, signals: &[Signal]) -> Result<UpsertSummary, HistoryError> {
        for s in signals {
            self.check(&s.ticker, s.signal_type)?;
        }
        if signals.is_empty() {
            return Ok(UpsertSummary::default());
        }
        self.store
            .merge(&self.ticker, self.signal_type, signals.to_vec())
    }

    fn recent(
        &self,
        ticker: &str,
        signal_type: SignalType,
        limit: usize,
    ) -> Result<Vec<Signal>, HistoryError> {
        self.store.recent(ticker, signal_type, limit)
    }
}
