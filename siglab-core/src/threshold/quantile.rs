use super::rolling::{quantile, sample_std, trailing};
use super::{ThresholdMethod, ThresholdPolicy};

/// `quantile_min`-th quantile of confidence over a trailing window.
///
/// Shares the z-score fallback rule: a flat window (zero std) falls back too,
/// otherwise a run of zero confidences would set a zero threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileThreshold {
    window: usize,
    q: f64,
    fallback: f64,
}

impl QuantileThreshold {
    pub fn new(window: usize, q: f64, fallback: f64) -> Self {
        Self {
            window,
            q,
            fallback,
        }
    }
}

impl ThresholdPolicy for QuantileThreshold {
    fn method(&self) -> ThresholdMethod {
        ThresholdMethod::Quantile
    }

    fn threshold(&self, confidence: &[f64]) -> (Vec<f64>, ThresholdMethod) {
        let values = (0..confidence.len())
            .map(|i| {
                let Some(window) = trailing(confidence, i, self.window) else {
                    return self.fallback;
                };
                let std = sample_std(window);
                if std == 0.0 || !std.is_finite() {
                    return self.fallback;
                }
                let value = quantile(window, self.q);
                if value.is_finite() {
                    value
                } else {
                    self.fallback
                }
            })
            .collect();
        (values, ThresholdMethod::Quantile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn short_series_is_all_fallback() {
        let conf: Vec<f64> = (0..99).map(|i| (i % 7) as f64 * 0.002).collect();
        let (values, method) = QuantileThreshold::new(100, 0.9, 0.005).threshold(&conf);
        assert_eq!(method, ThresholdMethod::Quantile);
        assert!(values.iter().all(|&v| v == 0.005));
    }

    #[test]
    fn percentile_of_trailing_window() {
        let conf = [0.5, 0.5, 0.5, 0.5, 0.01, 0.02, 0.03, 0.04];
        let (values, _) = QuantileThreshold::new(4, 0.9, 0.005).threshold(&conf);
        assert!(values[..4].iter().all(|&v| v == 0.005));
        // Bar 7: sorted [0.01, 0.02, 0.03, 0.04], pos 2.7 -> 0.037
        assert_approx(values[7], 0.037, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_window_falls_back() {
        let conf = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (values, _) = QuantileThreshold::new(2, 0.9, 0.006).threshold(&conf);
        assert!(values.iter().all(|&v| v == 0.006));
    }
}
