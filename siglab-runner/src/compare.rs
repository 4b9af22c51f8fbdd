//! Fixed vs adaptive threshold comparison over the same bars.

use serde::{Deserialize, Serialize};

use siglab_core::{BarSeries, EngineRun, Signal, SignalAction, SignalEngine, SignalType};

/// BUY / SELL / STAY counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub buy: usize,
    pub sell: usize,
    pub stay: usize,
}

impl ActionCounts {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut counts = Self::default();
        for s in signals {
            match s.signal {
                SignalAction::Buy => counts.buy += 1,
                SignalAction::Sell => counts.sell += 1,
                SignalAction::Stay => counts.stay += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.buy + self.sell + self.stay
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyComparison {
    pub ticker: String,
    pub bars: usize,
    pub fixed: ActionCounts,
    pub adaptive: ActionCounts,
    /// Bars where the two policies emitted different actions.
    pub disagreements: usize,
    pub mean_fixed_threshold: f64,
    pub mean_adaptive_threshold: f64,
}

pub fn compare_policies(series: &BarSeries, engine: &SignalEngine) -> PolicyComparison {
    let runs = engine.run_types(series, &[SignalType::MaFixed, SignalType::MaDynamic]);
    let (fixed, adaptive) = (&runs[0], &runs[1]);

    let disagreements = fixed
        .signals
        .iter()
        .zip(&adaptive.signals)
        .filter(|(a, b)| a.signal != b.signal)
        .count();

    PolicyComparison {
        ticker: series.ticker().to_string(),
        bars: series.len(),
        fixed: ActionCounts::from_signals(&fixed.signals),
        adaptive: ActionCounts::from_signals(&adaptive.signals),
        disagreements,
        mean_fixed_threshold: mean_threshold(fixed),
        mean_adaptive_threshold: mean_threshold(adaptive),
    }
}

fn mean_threshold(run: &EngineRun) -> f64 {
    if run.rows.is_empty() {
        return f64::NAN;
    }
    run.rows.iter().map(|r| r.threshold_used).sum::<f64>() / run.rows.len() as f64
}
