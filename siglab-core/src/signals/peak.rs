//! Peak-zone detection: is the close within tolerance of its recent high?

use crate::domain::Bar;
use crate::indicators::{Indicator, RollingMax};

#[derive(Debug, Clone, PartialEq)]
pub struct PeakZone {
    /// Rolling max of close; NaN until `peak_window` bars exist.
    pub recent_max: Vec<f64>,
    /// False wherever `recent_max` is undefined.
    pub is_peak_zone: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakZoneDetector {
    window: usize,
    threshold: f64,
}

impl PeakZoneDetector {
    pub fn new(window: usize, threshold: f64) -> Self {
        Self { window, threshold }
    }

    /// `close >= recent_max * threshold`, false when undefined.
    pub fn in_zone(close: f64, recent_max: f64, threshold: f64) -> bool {
        !recent_max.is_nan() && close >= recent_max * threshold
    }

    pub fn compute(&self, bars: &[Bar]) -> PeakZone {
        let recent_max = RollingMax::new(self.window).compute(bars);
        let is_peak_zone = bars
            .iter()
            .zip(&recent_max)
            .map(|(bar, &max)| Self::in_zone(bar.close, max, self.threshold))
            .collect();
        PeakZone {
            recent_max,
            is_peak_zone,
        }
    }
}
