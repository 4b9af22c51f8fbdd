//! Resume-aware wrapper around [`SignalEngine`].
//!
//! Looks up the last persisted signal for the `(ticker, signal_type)`, runs
//! the engine, and keeps only bars strictly after that signal. When no new
//! bars exist the previous signal is returned untouched and nothing is
//! computed.
//!
//! Callers must serialize invocations per `(ticker, signal_type)` between
//! the lookup and the write.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::data::BarSeries;
use crate::domain::{Signal, SignalType};
use crate::engine::{EngineRun, SignalEngine};
use crate::error::EngineError;
use crate::history::{SignalHistory, UpsertSummary};

#[derive(Debug, Clone, PartialEq)]
pub enum IncrementalOutcome {
    /// No prior signal: the whole series was processed.
    ColdStart { run: EngineRun },
    /// Only bars after `since` are in `run`.
    Resumed { since: NaiveDateTime, run: EngineRun },
    /// No bars after the last persisted signal.
    UpToDate { last: Signal },
}

impl IncrementalOutcome {
    /// Signals that are new in this invocation.
    pub fn new_signals(&self) -> &[Signal] {
        match self {
            Self::ColdStart { run } | Self::Resumed { run, .. } => &run.signals,
            Self::UpToDate { .. } => &[],
        }
    }

    pub fn run(&self) -> Option<&EngineRun> {
        match self {
            Self::ColdStart { run } | Self::Resumed { run, .. } => Some(run),
            Self::UpToDate { .. } => None,
        }
    }

    /// Latest signal after this invocation: the newest emitted, or the
    /// previous one when nothing was new.
    pub fn latest(&self) -> Option<&Signal> {
        match self {
            Self::ColdStart { run } | Self::Resumed { run, .. } => run.last_signal(),
            Self::UpToDate { last } => Some(last),
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::UpToDate { .. })
    }
}

#[derive(Debug, Clone)]
pub struct IncrementalProcessor {
    engine: SignalEngine,
}

impl IncrementalProcessor {
    pub fn new(engine: SignalEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn process<H: SignalHistory + ?Sized>(
        &self,
        series: &BarSeries,
        signal_type: SignalType,
        history: &H,
    ) -> Result<IncrementalOutcome, EngineError> {
        let ticker = series.ticker();
        let last = history
            .last_signal(ticker, signal_type)
            .map_err(EngineError::HistoryLookup)?;

        let Some(last) = last else {
            info!(ticker, signal_type = %signal_type, bars = series.len(), "cold start");
            return Ok(IncrementalOutcome::ColdStart {
                run: self.engine.run(series, signal_type),
            });
        };

        let since = last.timestamp;
        if series.first_index_after(since) == series.len() {
            debug!(ticker, signal_type = %signal_type, %since, "no new bars");
            return Ok(IncrementalOutcome::UpToDate { last });
        }

        // Full series keeps the rolling windows identical to earlier runs.
        let mut run = self.engine.run(series, signal_type);
        run.retain_after(since);
        info!(
            ticker,
            signal_type = %signal_type,
            %since,
            new_bars = run.signals.len(),
            "resumed"
        );
        Ok(IncrementalOutcome::Resumed { since, run })
    }

    /// [`process`](Self::process), then upsert the new signals.
    pub fn process_and_store<H: SignalHistory + ?Sized>(
        &self,
        series: &BarSeries,
        signal_type: SignalType,
        history: &mut H,
    ) -> Result<(IncrementalOutcome, UpsertSummary), EngineError> {
        let outcome = self.process(series, signal_type, &*history)?;
        let summary = match outcome.new_signals() {
            [] => UpsertSummary::default(),
            signals => history.upsert(signals).map_err(EngineError::HistoryWrite)?,
        };
        Ok((outcome, summary))
    }

    /// Every signal type in the configured emission, each resumed from its
    /// own history.
    pub fn process_all<H: SignalHistory + ?Sized>(
        &self,
        series: &BarSeries,
        history: &mut H,
    ) -> Result<Vec<(IncrementalOutcome, UpsertSummary)>, EngineError> {
        self.engine
            .config()
            .emission
            .signal_types()
            .iter()
            .map(|&signal_type| self.process_and_store(series, signal_type, history))
            .collect()
    }
}
