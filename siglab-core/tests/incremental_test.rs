//! Incremental processing: determinism, idempotence and monotonic resume.

use chrono::NaiveDate;
use siglab_core::domain::{Bar, Signal, SignalAction, SignalType};
use siglab_core::engine::{Emission, EngineConfig, SignalEngine};
use siglab_core::history::{HistoryError, MemoryHistory, SignalHistory, UpsertSummary};
use siglab_core::incremental::{IncrementalOutcome, IncrementalProcessor};
use siglab_core::{BarSeries, EngineError};

fn walk(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 2, 5)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let mut price = 50.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            price += ((seed >> 33) % 100) as f64 / 100.0 - 0.495;
            let close = price;
            Bar {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open: close - 0.05,
                high: close + 0.1,
                low: close - 0.1,
                close,
                volume: 5_000.0,
            }
        })
        .collect()
}

fn processor(emission: Emission) -> IncrementalProcessor {
    let config = EngineConfig {
        emission,
        ..Default::default()
    };
    IncrementalProcessor::new(SignalEngine::new(config).unwrap())
}

#[test]
fn repeated_runs_are_identical() {
    let series = BarSeries::from_bars("QQQ", walk(250)).unwrap();
    let p = processor(Emission::Both);
    let history = MemoryHistory::new();

    for signal_type in [SignalType::MaFixed, SignalType::MaDynamic] {
        let a = p.process(&series, signal_type, &history).unwrap();
        let b = p.process(&series, signal_type, &history).unwrap();
        assert_eq!(a, b);
        let json_a = serde_json::to_string(a.new_signals()).unwrap();
        let json_b = serde_json::to_string(b.new_signals()).unwrap();
        assert_eq!(json_a, json_b);
    }
}

#[test]
fn second_call_without_new_bars_reuses_last_signal() {
    let series = BarSeries::from_bars("QQQ", walk(120)).unwrap();
    let p = processor(Emission::Adaptive);
    let mut history = MemoryHistory::new();

    let (first, _) = p
        .process_and_store(&series, SignalType::MaDynamic, &mut history)
        .unwrap();
    let (second, summary) = p
        .process_and_store(&series, SignalType::MaDynamic, &mut history)
        .unwrap();

    assert!(matches!(second, IncrementalOutcome::UpToDate { .. }));
    assert!(second.run().is_none());
    assert_eq!(second.latest(), first.latest());
    assert_eq!(summary, UpsertSummary::default());
}

#[test]
fn resumed_signals_are_strictly_newer_and_match_full_run() {
    let bars = walk(300);
    let p = processor(Emission::Adaptive);
    let mut history = MemoryHistory::new();

    // Grow the series tick by tick, persisting after each step.
    for end in (100..=300).step_by(25) {
        let series = BarSeries::from_bars("QQQ", bars[..end].to_vec()).unwrap();
        let prior = history
            .last_signal_timestamp("QQQ", SignalType::MaDynamic)
            .unwrap();
        let (outcome, _) = p
            .process_and_store(&series, SignalType::MaDynamic, &mut history)
            .unwrap();
        if let Some(t) = prior {
            assert!(outcome.new_signals().iter().all(|s| s.timestamp > t));
        }
    }

    let full = BarSeries::from_bars("QQQ", bars).unwrap();
    let cold = p.engine().run(&full, SignalType::MaDynamic);
    let stored = history.recent("QQQ", SignalType::MaDynamic, usize::MAX).unwrap();
    assert_eq!(stored.len(), 300);
    assert_eq!(stored, cold.signals);
}

#[test]
fn dual_emission_resumes_each_type_independently() {
    let bars = walk(150);
    let p = processor(Emission::Both);
    let mut history = MemoryHistory::new();

    // Only the fixed history has been written so far.
    let head = BarSeries::from_bars("QQQ", bars[..100].to_vec()).unwrap();
    p.process_and_store(&head, SignalType::MaFixed, &mut history)
        .unwrap();

    let full = BarSeries::from_bars("QQQ", bars).unwrap();
    let results = p.process_all(&full, &mut history).unwrap();
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0].0, IncrementalOutcome::Resumed { .. }));
    assert_eq!(results[0].1.inserted, 50);
    assert!(matches!(results[1].0, IncrementalOutcome::ColdStart { .. }));
    assert_eq!(results[1].1.inserted, 150);
}

struct BrokenStore;

impl SignalHistory for BrokenStore {
    fn last_signal(&self, ticker: &str, signal_type: SignalType) -> Result<Option<Signal>, HistoryError> {
        Err(HistoryError::Locked {
            ticker: ticker.to_string(),
            signal_type,
        })
    }

    fn upsert(&mut self, _signals: &[Signal]) -> Result<UpsertSummary, HistoryError> {
        unreachable!("lookup fails first")
    }

    fn recent(&self, _: &str, _: SignalType, _: usize) -> Result<Vec<Signal>, HistoryError> {
        Ok(Vec::new())
    }
}

#[test]
fn lookup_failure_surfaces_distinctly() {
    let series = BarSeries::from_bars("QQQ", walk(60)).unwrap();
    let err = processor(Emission::Fixed)
        .process_and_store(&series, SignalType::MaFixed, &mut BrokenStore)
        .unwrap_err();
    match err {
        EngineError::HistoryLookup(HistoryError::Locked { ticker, .. }) => {
            assert_eq!(ticker, "QQQ")
        }
        other => panic!("expected HistoryLookup, got {other}"),
    }
}

#[test]
fn write_failure_is_history_write() {
    struct ReadOnly(MemoryHistory);

    impl SignalHistory for ReadOnly {
        fn last_signal(&self, t: &str, st: SignalType) -> Result<Option<Signal>, HistoryError> {
            self.0.last_signal(t, st)
        }
        fn upsert(&mut self, _: &[Signal]) -> Result<UpsertSummary, HistoryError> {
            Err(HistoryError::Serialization("read-only".into()))
        }
        fn recent(&self, t: &str, st: SignalType, n: usize) -> Result<Vec<Signal>, HistoryError> {
            self.0.recent(t, st, n)
        }
    }

    let series = BarSeries::from_bars("QQQ", walk(60)).unwrap();
    let err = processor(Emission::Fixed)
        .process_and_store(&series, SignalType::MaFixed, &mut ReadOnly(MemoryHistory::new()))
        .unwrap_err();
    assert!(matches!(err, EngineError::HistoryWrite(_)));
}

#[test]
fn stay_signals_are_persisted_too() {
    let series = BarSeries::from_bars("QQQ", walk(30)).unwrap();
    let mut history = MemoryHistory::new();
    processor(Emission::Fixed)
        .process_and_store(&series, SignalType::MaFixed, &mut history)
        .unwrap();
    let stored = history.recent("QQQ", SignalType::MaFixed, 100).unwrap();
    assert_eq!(stored.len(), 30);
    assert_eq!(stored[0].signal, SignalAction::Stay);
}
