//! Validated bar series.
//!
//! `BarSeries` is the only way bars enter the engine. Construction enforces:
//! every field present and finite, ascending unique timestamps, `close > 0`,
//! and at least one bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Bar;
use crate::error::EngineError;

/// One untyped row from a tabular source. `None` marks a null or unparseable cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<NaiveDateTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    /// Convert to a `Bar` if every field is present and finite.
    pub fn to_bar(&self) -> Option<Bar> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(Bar {
            timestamp: self.timestamp?,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            volume: finite(self.volume)?,
        })
    }
}

/// What cleaning removed from the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_null: usize,
    pub dropped_duplicate: usize,
}

/// Ascending, deduplicated, non-empty bar series for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
    report: CleaningReport,
}

impl BarSeries {
    /// Clean raw rows: drop incomplete rows, sort, dedupe (first occurrence wins).
    pub fn from_raw(ticker: impl Into<String>, rows: Vec<RawBar>) -> Result<Self, EngineError> {
        let input_rows = rows.len();
        let bars: Vec<Bar> = rows.iter().filter_map(RawBar::to_bar).collect();
        let dropped_null = input_rows - bars.len();
        Self::clean(ticker.into(), bars, input_rows, dropped_null)
    }

    /// Build from typed bars, applying the same cleaning rules.
    pub fn from_bars(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, EngineError> {
        let input_rows = bars.len();
        let kept: Vec<Bar> = bars.into_iter().filter(|b| !b.is_void()).collect();
        let dropped_null = input_rows - kept.len();
        Self::clean(ticker.into(), kept, input_rows, dropped_null)
    }

    fn clean(
        ticker: String,
        mut bars: Vec<Bar>,
        input_rows: usize,
        dropped_null: usize,
    ) -> Result<Self, EngineError> {
        // Stable sort keeps the original order among equal timestamps.
        bars.sort_by_key(|b| b.timestamp);
        let before_dedup = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        let dropped_duplicate = before_dedup - bars.len();

        // Only surviving rows are checked; a dropped duplicate cannot fail the series.
        if let Some(bad) = bars.iter().find(|b| b.close <= 0.0) {
            return Err(EngineError::validation(
                "close",
                format!("must be > 0, got {} at {}", bad.close, bad.timestamp),
            ));
        }

        if bars.is_empty() {
            return Err(EngineError::EmptySeries { ticker });
        }

        let report = CleaningReport {
            input_rows,
            dropped_null,
            dropped_duplicate,
        };
        debug!(
            ticker = %ticker,
            bars = bars.len(),
            dropped_null,
            dropped_duplicate,
            "bar series cleaned"
        );

        Ok(Self {
            ticker,
            bars,
            report,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false: an empty series cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn report(&self) -> CleaningReport {
        self.report
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }

    /// Index of the first bar strictly after `ts` (`len()` if none).
    pub fn first_index_after(&self, ts: NaiveDateTime) -> usize {
        self.bars.partition_point(|b| b.timestamp <= ts)
    }
}
