//! Classification behavior through the public engine.

use chrono::NaiveDate;
use siglab_core::domain::{Bar, SignalAction, SignalType};
use siglab_core::engine::{EngineConfig, SignalEngine};
use siglab_core::error::EngineWarning;
use siglab_core::signals::{classify, BarInputs, PeakZoneDetector};
use siglab_core::threshold::ThresholdMethod;
use siglab_core::BarSeries;

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            timestamp: start + chrono::Duration::minutes(5 * i as i64),
            open: c,
            high: c + 0.5,
            low: c - 0.5,
            close: c,
            volume: 10_000.0,
        })
        .collect()
}

fn series(closes: &[f64]) -> BarSeries {
    BarSeries::from_bars("SPY", bars_from_closes(closes)).unwrap()
}

#[test]
fn buy_candidate_downgraded_when_below_threshold() {
    let close = 100.0;
    let recent_max = 100.0;
    let inputs = BarInputs {
        ma_short: 10.0,
        ma_long: 9.0,
        recent_max,
        is_peak_zone: PeakZoneDetector::in_zone(close, recent_max, 0.99),
        confidence: 1.0 / 9.0,
        threshold: 0.2,
    };
    let c = classify(&inputs);
    assert_eq!(c.signal, SignalAction::Stay);
    assert!(c.reasoning.contains("0.1111 < 0.2000"));

    let c = classify(&BarInputs {
        threshold: 0.005,
        ..inputs
    });
    assert_eq!(c.signal, SignalAction::Buy);
}

#[test]
fn sell_outside_peak_zone_stays() {
    let inputs = BarInputs {
        ma_short: 9.0,
        ma_long: 10.0,
        recent_max: 100.0,
        is_peak_zone: PeakZoneDetector::in_zone(90.0, 100.0, 0.99),
        confidence: 0.1,
        threshold: 0.005,
    };
    assert!(!inputs.is_peak_zone);
    let c = classify(&inputs);
    assert_eq!(c.signal, SignalAction::Stay);
    assert!(c.reasoning.to_lowercase().contains("price not near recent peak"));
}

#[test]
fn zero_long_ma_yields_zero_confidence() {
    let inputs = BarInputs {
        ma_short: 0.0,
        ma_long: 0.0,
        recent_max: 0.0,
        is_peak_zone: true,
        confidence: 0.0,
        threshold: 0.005,
    };
    let c = classify(&inputs);
    assert_eq!(c.confidence, 0.0);
    assert_eq!(c.signal, SignalAction::Stay);
}

#[test]
fn constant_series_of_25_bars_stays_everywhere() {
    let s = series(&[100.0; 25]);
    let engine = SignalEngine::new(EngineConfig::default()).unwrap();

    for signal_type in [SignalType::MaFixed, SignalType::MaDynamic] {
        let run = engine.run(&s, signal_type);
        assert_eq!((run.short_window, run.long_window), (3, 12));
        assert!(matches!(
            run.warnings.as_slice(),
            [EngineWarning::InsufficientData { bars: 25, .. }]
        ));

        assert!(run.signals.iter().all(|s| s.signal == SignalAction::Stay));
        for (row, signal) in run.rows.iter().zip(&run.signals) {
            assert_eq!(signal.confidence, 0.0);
            if row.has_full_window() {
                assert_eq!(row.ma_short, 100.0);
                assert_eq!(row.ma_long, 100.0);
            }
        }
        let insufficient = run
            .signals
            .iter()
            .take_while(|s| s.reasoning.to_lowercase().contains("insufficient data"))
            .count();
        assert_eq!(insufficient, run.long_window - 1);
    }
}

#[test]
fn constant_series_without_rescale() {
    let s = series(&[100.0; 25]);
    let config = EngineConfig {
        rescale_short_series: false,
        ..Default::default()
    };
    let run = SignalEngine::new(config).unwrap().run(&s, SignalType::MaFixed);
    assert!(run.warnings.is_empty());
    assert!(run.signals[..19]
        .iter()
        .all(|s| s.reasoning.to_lowercase().contains("insufficient data")));
    assert!(run.signals[19..]
        .iter()
        .all(|s| s.signal == SignalAction::Stay && s.reasoning.contains("Confidence too low")));
}

#[test]
fn adaptive_threshold_falls_back_on_short_series() {
    let closes: Vec<f64> = (0..90).map(|i| 100.0 + (i as f64 * 0.4).sin() * 3.0).collect();
    let run = SignalEngine::new(EngineConfig::default())
        .unwrap()
        .run(&series(&closes), SignalType::MaDynamic);
    assert!(run.rows.iter().all(|r| r.threshold_used == 0.005));
    assert!(run
        .rows
        .iter()
        .all(|r| r.threshold_method == ThresholdMethod::ZScore));
}

#[test]
fn rally_then_selloff_near_peak_sells() {
    // Flat base, sharp rally, a plateau, then a dip that stays within 1% of the high.
    let mut closes = vec![100.0; 40];
    closes.extend((1..=20).map(|i| 100.0 + i as f64 * 2.0));
    closes.extend([140.0; 6]);
    closes.extend([138.7, 138.7]);
    let run = SignalEngine::new(EngineConfig {
        short_window: 2,
        long_window: 6,
        ..Default::default()
    })
    .unwrap()
    .run(&series(&closes), SignalType::MaFixed);

    let buys = run.signals.iter().filter(|s| s.signal == SignalAction::Buy).count();
    assert!(buys > 0);
    let last = run.signals.last().unwrap();
    // ma_short 138.7 < ma_long 139.57, confidence ~0.0062; 138.7 >= 0.99 * 140.
    assert_eq!(last.signal, SignalAction::Sell, "{}", last.reasoning);
}

#[test]
fn closes_near_f64_max_keep_confidence_finite() {
    let closes: Vec<f64> = (0..60)
        .map(|i| if i % 3 == 0 { f64::MAX } else { f64::MAX * 0.9 })
        .collect();
    let engine = SignalEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&series(&closes), SignalType::MaDynamic);

    assert_eq!(run.signals.len(), 60);
    for s in &run.signals {
        assert!(s.confidence.is_finite(), "{s:?}");
        assert!(s.threshold_used.is_finite(), "{s:?}");
        assert!(!s.reasoning.contains("NaN"), "{}", s.reasoning);
    }
    let json = serde_json::to_string(&run.signals).unwrap();
    let back: Vec<siglab_core::Signal> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, run.signals);
}
