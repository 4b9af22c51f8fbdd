//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of close over the trailing `period` bars, inclusive of the
//! current bar. Lookback: period - 1 (first valid value at index period-1).
//!
//! A window whose plain sum overflows is averaged term by term instead, so
//! any window of finite closes has a finite mean.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
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
            // NaN in the window propagates through the sum.
            let p = self.period as f64;
            let mean = window.iter().map(|b| b.close).sum::<f64>() / p;
            result[i] = if mean.is_infinite() {
                window.iter().map(|b| b.close / p).sum()
            } else {
                mean
            };
        }

        result
    }
}
