//! Immutable engine parameters.

use serde::{Deserialize, Serialize};

use crate::domain::SignalType;
use crate::error::ConfigError;

/// Which threshold policies a run emits signals for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emission {
    /// Fixed threshold only (`ma_fixed`).
    Fixed,
    /// Adaptive threshold only (`ma_dynamic`).
    #[default]
    Adaptive,
    /// Both policies over the same bar window.
    Both,
}

impl Emission {
    pub fn signal_types(self) -> &'static [SignalType] {
        match self {
            Self::Fixed => &[SignalType::MaFixed],
            Self::Adaptive => &[SignalType::MaDynamic],
            Self::Both => &[SignalType::MaFixed, SignalType::MaDynamic],
        }
    }
}

/// Engine configuration.
///
/// Passed by value into the engine at construction. Missing fields in a
/// serialized config take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub short_window: usize,
    pub long_window: usize,
    pub peak_window: usize,
    /// Fraction of the recent max a close must reach to be in the peak zone.
    pub peak_threshold: f64,
    /// Constant threshold for the fixed policy.
    pub confidence_threshold: f64,
    /// Adaptive policies fall back to this before the window fills or when
    /// the rolling std is zero.
    pub confidence_fallback_threshold: f64,
    pub adaptive_window: usize,
    pub z_min: f64,
    pub quantile_min: f64,
    /// Select the quantile adaptive method instead of z-score.
    pub use_quantile: bool,
    /// Scale both MA windows down when the series has fewer than
    /// `2 * long_window` bars.
    pub rescale_short_series: bool,
    pub emission: Emission,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            peak_window: 12,
            peak_threshold: 0.99,
            confidence_threshold: 0.005,
            confidence_fallback_threshold: 0.005,
            adaptive_window: 100,
            z_min: 1.0,
            quantile_min: 0.90,
            use_quantile: false,
            rescale_short_series: true,
            emission: Emission::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("peak_window", self.peak_window),
            ("adaptive_window", self.adaptive_window),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroWindow { name });
            }
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::WindowOrder {
                short: self.short_window,
                long: self.long_window,
            });
        }
        check_range("peak_threshold", "(0, 1]", self.peak_threshold, |v| {
            v > 0.0 && v <= 1.0
        })?;
        check_range("quantile_min", "[0, 1]", self.quantile_min, |v| {
            (0.0..=1.0).contains(&v)
        })?;
        check_range("confidence_threshold", "[0, inf)", self.confidence_threshold, |v| {
            v >= 0.0
        })?;
        check_range(
            "confidence_fallback_threshold",
            "[0, inf)",
            self.confidence_fallback_threshold,
            |v| v >= 0.0,
        )?;
        check_range("z_min", "[0, inf)", self.z_min, |v| v >= 0.0)?;
        Ok(())
    }

    /// Deterministic content hash of the parameters.
    ///
    /// Two configs with the same fingerprint produce the same signals for the
    /// same bars.
    pub fn fingerprint(&self) -> String {
        // Plain struct of numbers and enums: serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn check_range(
    name: &'static str,
    range: &'static str,
    value: f64,
    ok: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, range, value })
    }
}
