use chrono::NaiveDateTime;
use tracing::debug;

use super::config::EngineConfig;
use super::derived::DerivedBar;
use crate::data::BarSeries;
use crate::domain::{Signal, SignalType};
use crate::error::{ConfigError, EngineWarning};
use crate::signals::{classify, BarInputs, MovingAverageCalculator, PeakZoneDetector};
use crate::threshold::{policy_for, ThresholdPolicy};

/// Output of one engine invocation for one signal type.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRun {
    pub ticker: String,
    pub signal_type: SignalType,
    /// Moving average windows actually used.
    pub short_window: usize,
    pub long_window: usize,
    /// Parallel to `signals`.
    pub rows: Vec<DerivedBar>,
    pub signals: Vec<Signal>,
    pub warnings: Vec<EngineWarning>,
}

impl EngineRun {
    /// Drop every bar at or before `ts`.
    pub fn retain_after(&mut self, ts: NaiveDateTime) {
        let start = self.signals.partition_point(|s| s.timestamp <= ts);
        self.rows.drain(..start);
        self.signals.drain(..start);
    }

    pub fn last_signal(&self) -> Option<&Signal> {
        self.signals.last()
    }
}

/// Bar-derived values shared by every threshold policy.
struct Features {
    short_window: usize,
    long_window: usize,
    ma_short: Vec<f64>,
    ma_long: Vec<f64>,
    recent_max: Vec<f64>,
    is_peak_zone: Vec<bool>,
    /// Zero on bars lacking a full window, so thresholds never see NaN.
    confidence: Vec<f64>,
    warnings: Vec<EngineWarning>,
}

/// Stateless signal engine.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Signals of one type over the whole series.
    pub fn run(&self, series: &BarSeries, signal_type: SignalType) -> EngineRun {
        let features = self.features(series);
        let policy = policy_for(signal_type, &self.config);
        self.classify(series, &features, signal_type, policy.as_ref())
    }

    /// One run per signal type in the configured emission, over the same bars.
    pub fn run_all(&self, series: &BarSeries) -> Vec<EngineRun> {
        self.run_types(series, self.config.emission.signal_types())
    }

    pub fn run_types(&self, series: &BarSeries, signal_types: &[SignalType]) -> Vec<EngineRun> {
        let features = self.features(series);
        signal_types
            .iter()
            .map(|&signal_type| {
                let policy = policy_for(signal_type, &self.config);
                self.classify(series, &features, signal_type, policy.as_ref())
            })
            .collect()
    }

    fn features(&self, series: &BarSeries) -> Features {
        let bars = series.bars();
        let ma = MovingAverageCalculator::new(
            self.config.short_window,
            self.config.long_window,
            self.config.rescale_short_series,
        )
        .compute(bars);
        let peak =
            PeakZoneDetector::new(self.config.peak_window, self.config.peak_threshold).compute(bars);

        let confidence = (0..bars.len())
            .map(|i| {
                let undefined = ma.ma_short[i].is_nan()
                    || ma.ma_long[i].is_nan()
                    || peak.recent_max[i].is_nan();
                if undefined {
                    0.0
                } else {
                    ma.confidence[i]
                }
            })
            .collect();

        Features {
            short_window: ma.short_window,
            long_window: ma.long_window,
            ma_short: ma.ma_short,
            ma_long: ma.ma_long,
            recent_max: peak.recent_max,
            is_peak_zone: peak.is_peak_zone,
            confidence,
            warnings: ma.warnings,
        }
    }

    fn classify(
        &self,
        series: &BarSeries,
        features: &Features,
        signal_type: SignalType,
        policy: &dyn ThresholdPolicy,
    ) -> EngineRun {
        let bars = series.bars();
        let (thresholds, method) = policy.threshold(&features.confidence);

        let mut rows = Vec::with_capacity(bars.len());
        let mut signals = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let inputs = BarInputs {
                ma_short: features.ma_short[i],
                ma_long: features.ma_long[i],
                recent_max: features.recent_max[i],
                is_peak_zone: features.is_peak_zone[i],
                confidence: features.confidence[i],
                threshold: thresholds[i],
            };
            let decision = classify(&inputs);

            rows.push(DerivedBar {
                timestamp: bar.timestamp,
                close: bar.close,
                ma_short: inputs.ma_short,
                ma_long: inputs.ma_long,
                recent_max: inputs.recent_max,
                is_peak_zone: inputs.is_peak_zone,
                confidence: decision.confidence,
                threshold_used: inputs.threshold,
                threshold_method: method,
            });
            signals.push(Signal {
                ticker: series.ticker().to_string(),
                timestamp: bar.timestamp,
                signal: decision.signal,
                signal_type,
                confidence: decision.confidence,
                threshold_used: inputs.threshold,
                reasoning: decision.reasoning,
            });
        }

        debug!(
            ticker = series.ticker(),
            signal_type = %signal_type,
            method = %method,
            bars = bars.len(),
            short_window = features.short_window,
            long_window = features.long_window,
            "signals computed"
        );

        EngineRun {
            ticker: series.ticker().to_string(),
            signal_type,
            short_window: features.short_window,
            long_window: features.long_window,
            rows,
            signals,
            warnings: features.warnings.clone(),
        }
    }
}
