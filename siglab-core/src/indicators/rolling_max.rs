//! Rolling maximum of close over a trailing window, inclusive of the current bar.
//!
//! Lookback: period - 1. A NaN close anywhere in the window yields NaN.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RollingMax {
    period: usize,
    name: String,
}

impl RollingMax {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RollingMax period must be >= 1");
        Self {
            period,
            name: format!("max_{period}"),
        }
    }
}

impl Indicator for RollingMax {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            let mut max_val = f64::NEG_INFINITY;
            let mut has_nan = false;
            for bar in window {
                if bar.close.is_nan() {
                    has_nan = true;
                    break;
                }
                if bar.close > max_val {
                    max_val = bar.close;
                }
            }
            result[i] = if has_nan { f64::NAN } else { max_val };
        }

        result
    }
}
