//! Short/long moving averages and the normalized distance between them.

use tracing::warn;

use crate::domain::Bar;
use crate::error::EngineWarning;
use crate::indicators::{Indicator, Sma};

/// Smallest windows allowed after rescaling.
pub const MIN_SHORT_WINDOW: usize = 3;
pub const MIN_LONG_WINDOW: usize = 5;

/// Windows to use for a series of `bars` bars.
///
/// Series shorter than `2 * long` scale both windows down: long becomes
/// `bars / 2` and short keeps its ratio to long, floored at 3 and 5. Windows
/// never grow past the requested ones.
pub fn effective_windows(bars: usize, short: usize, long: usize) -> (usize, usize) {
    if bars >= 2 * long || long <= MIN_LONG_WINDOW {
        return (short, long);
    }
    let long_eff = (bars / 2).max(MIN_LONG_WINDOW);
    let short_eff = (short * bars / (2 * long))
        .max(MIN_SHORT_WINDOW)
        .min(short)
        .min(long_eff - 1);
    (short_eff, long_eff)
}

/// Per-bar moving averages and confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub ma_short: Vec<f64>,
    pub ma_long: Vec<f64>,
    /// `|ma_short - ma_long| / ma_long`; NaN where either average is undefined.
    pub confidence: Vec<f64>,
    pub warnings: Vec<EngineWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageCalculator {
    short_window: usize,
    long_window: usize,
    rescale_short_series: bool,
}

impl MovingAverageCalculator {
    pub fn new(short_window: usize, long_window: usize, rescale_short_series: bool) -> Self {
        Self {
            short_window,
            long_window,
            rescale_short_series,
        }
    }

    pub fn compute(&self, bars: &[Bar]) -> MaCrossover {
        let n = bars.len();
        let mut warnings = Vec::new();

        let (short_window, long_window) = if self.rescale_short_series {
            effective_windows(n, self.short_window, self.long_window)
        } else {
            (self.short_window, self.long_window)
        };
        if (short_window, long_window) != (self.short_window, self.long_window) {
            warn!(
                bars = n,
                requested_short = self.short_window,
                requested_long = self.long_window,
                short_window,
                long_window,
                "short series: moving average windows rescaled"
            );
            warnings.push(EngineWarning::InsufficientData {
                bars: n,
                requested_short: self.short_window,
                requested_long: self.long_window,
                effective_short: short_window,
                effective_long: long_window,
            });
        }

        let ma_short = Sma::new(short_window).compute(bars);
        let ma_long = Sma::new(long_window).compute(bars);

        let mut degenerate = 0usize;
        let confidence = ma_short
            .iter()
            .zip(&ma_long)
            .map(|(&s, &l)| {
                if s.is_nan() || l.is_nan() {
                    f64::NAN
                } else {
                    let c = (s - l).abs() / l;
                    if l == 0.0 || !c.is_finite() {
                        degenerate += 1;
                        0.0
                    } else {
                        c
                    }
                }
            })
            .collect();

        if degenerate > 0 {
            warn!(bars = degenerate, "zero long moving average or non-finite confidence, forced to 0");
            warnings.push(EngineWarning::DegenerateInput { bars: degenerate });
        }

        MaCrossover {
            short_window,
            long_window,
            ma_short,
            ma_long,
            confidence,
            warnings,
        }
    }
}
