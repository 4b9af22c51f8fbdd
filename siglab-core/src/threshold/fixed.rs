use super::{ThresholdMethod, ThresholdPolicy};

/// Caller-supplied constant for every bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedThreshold {
    value: f64,
}

impl FixedThreshold {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl ThresholdPolicy for FixedThreshold {
    fn method(&self) -> ThresholdMethod {
        ThresholdMethod::Fixed
    }

    fn threshold(&self, confidence: &[f64]) -> (Vec<f64>, ThresholdMethod) {
        (vec![self.value; confidence.len()], ThresholdMethod::Fixed)
    }
}
