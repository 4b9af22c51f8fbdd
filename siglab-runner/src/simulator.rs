//! Seeded random-walk bar generator.
//!
//! Each bar opens at the previous close and moves by a uniform fraction in
//! `[-volatility, +volatility]`. High and low widen the open/close range by
//! up to 0.2%. Same seed, same bars.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use siglab_core::Bar;

/// Maximum high/low widening as a fraction of price.
const WICK: f64 = 0.002;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("base price must be finite and > 0, got {0}")]
    BasePrice(f64),

    #[error("volatility must be in [0, 1), got {0}")]
    Volatility(f64),

    #[error("{bars} bars from {start} run past the timestamp range")]
    Span { bars: usize, start: NaiveDateTime },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSimulator {
    pub base_price: f64,
    pub volatility: f64,
    pub volume_range: (u64, u64),
    pub interval: Duration,
}

impl Default for BarSimulator {
    fn default() -> Self {
        Self {
            base_price: 100.0,
            volatility: 0.01,
            volume_range: (1_000, 10_000),
            interval: Duration::minutes(5),
        }
    }
}

impl BarSimulator {
    /// A volatility of 1 or more can drive the close to zero or below.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if !(self.base_price.is_finite() && self.base_price > 0.0) {
            return Err(SimulatorError::BasePrice(self.base_price));
        }
        if !(0.0..1.0).contains(&self.volatility) {
            return Err(SimulatorError::Volatility(self.volatility));
        }
        Ok(())
    }

    /// Time covered by `n` bars, if it fits.
    pub fn span(&self, n: usize) -> Option<Duration> {
        i32::try_from(n)
            .ok()
            .and_then(|n| self.interval.checked_mul(n))
    }

    pub fn generate(
        &self,
        start: NaiveDateTime,
        n: usize,
        seed: u64,
    ) -> Result<Vec<Bar>, SimulatorError> {
        self.validate()?;
        self.span(n)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or(SimulatorError::Span { bars: n, start })?;

        let mut rng = StdRng::seed_from_u64(seed);
        let (vol_lo, vol_hi) = if self.volume_range.0 <= self.volume_range.1 {
            self.volume_range
        } else {
            (self.volume_range.1, self.volume_range.0)
        };

        let mut price = self.base_price;
        let mut timestamp = start;
        let mut bars = Vec::with_capacity(n);
        for _ in 0..n {
            let change = (2.0 * rng.gen::<f64>() - 1.0) * self.volatility * price;
            let open = price;
            let close = price + change;
            let high = open.max(close) * (1.0 + rng.gen::<f64>() * WICK);
            let low = open.min(close) * (1.0 - rng.gen::<f64>() * WICK);
            let volume = rng.gen_range(vol_lo..=vol_hi) as f64;

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
            timestamp += self.interval;
        }
        Ok(bars)
    }
}
