use super::rolling::{mean, sample_std, trailing};
use super::{ThresholdMethod, ThresholdPolicy};

/// `mean + z_min * std` of confidence over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreThreshold {
    window: usize,
    z_min: f64,
    fallback: f64,
}

impl ZScoreThreshold {
    pub fn new(window: usize, z_min: f64, fallback: f64) -> Self {
        Self {
            window,
            z_min,
            fallback,
        }
    }
}

impl ThresholdPolicy for ZScoreThreshold {
    fn method(&self) -> ThresholdMethod {
        ThresholdMethod::ZScore
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
                let value = mean(window) + self.z_min * std;
                if value.is_finite() {
                    value
                } else {
                    self.fallback
                }
            })
            .collect();
        (values, ThresholdMethod::ZScore)
    }
}
