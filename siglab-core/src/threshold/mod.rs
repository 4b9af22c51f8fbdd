//! Confidence threshold policies.
//!
//! Each policy maps a confidence series to a per-bar threshold of the same
//! length, tagged with the method that produced it. The fixed and adaptive
//! policies are interchangeable behind [`ThresholdPolicy`], so both can be
//! evaluated over the same bars in one run.

pub mod fixed;
pub mod quantile;
pub mod rolling;
pub mod zscore;

pub use fixed::FixedThreshold;
pub use quantile::QuantileThreshold;
pub use zscore::ZScoreThreshold;

use serde::{Deserialize, Serialize};

use crate::domain::SignalType;
use crate::engine::EngineConfig;

/// Tag recorded with every threshold value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    Fixed,
    ZScore,
    Quantile,
}

impl ThresholdMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::ZScore => "zscore",
            Self::Quantile => "quantile",
        }
    }
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-bar confidence cutoff.
///
/// # Invariants
/// - Output length equals input length.
/// - The value at bar t depends only on `confidence[..=t]`.
/// - Every returned value is finite.
pub trait ThresholdPolicy: Send + Sync {
    fn method(&self) -> ThresholdMethod;

    fn threshold(&self, confidence: &[f64]) -> (Vec<f64>, ThresholdMethod);
}

/// Policy that produces signals of the given type under `config`.
pub fn policy_for(signal_type: SignalType, config: &EngineConfig) -> Box<dyn ThresholdPolicy> {
    match signal_type {
        SignalType::MaFixed => Box::new(FixedThreshold::new(config.confidence_threshold)),
        SignalType::MaDynamic if config.use_quantile => Box::new(QuantileThreshold::new(
            config.adaptive_window,
            config.quantile_min,
            config.confidence_fallback_threshold,
        )),
        SignalType::MaDynamic => Box::new(ZScoreThreshold::new(
            config.adaptive_window,
            config.z_min,
            config.confidence_fallback_threshold,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_selection_follows_config() {
        let cfg = EngineConfig::default();
        assert_eq!(
            policy_for(SignalType::MaFixed, &cfg).method(),
            ThresholdMethod::Fixed
        );
        assert_eq!(
            policy_for(SignalType::MaDynamic, &cfg).method(),
            ThresholdMethod::ZScore
        );

        let cfg = EngineConfig {
            use_quantile: true,
            ..Default::default()
        };
        assert_eq!(
            policy_for(SignalType::MaDynamic, &cfg).method(),
            ThresholdMethod::Quantile
        );
    }

    #[test]
    fn method_tags_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ThresholdMethod::ZScore).unwrap(),
            "\"zscore\""
        );
        assert_eq!(ThresholdMethod::Quantile.to_string(), "quantile");
    }
}
