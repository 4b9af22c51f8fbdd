//! Final per-bar decision.
//!
//! Precedence, first match wins:
//! 1. any of `ma_short`, `ma_long`, `recent_max` undefined: STAY, confidence 0
//! 2. crossover direction picks the candidate (equal averages: STAY)
//! 3. `confidence < threshold` downgrades to STAY; equality passes
//! 4. a SELL outside the peak zone downgrades to STAY
//! 5. the candidate stands

use crate::domain::SignalAction;

/// Inputs for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarInputs {
    pub ma_short: f64,
    pub ma_long: f64,
    pub recent_max: f64,
    pub is_peak_zone: bool,
    pub confidence: f64,
    pub threshold: f64,
}

impl BarInputs {
    pub fn is_insufficient(&self) -> bool {
        self.ma_short.is_nan() || self.ma_long.is_nan() || self.recent_max.is_nan()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub signal: SignalAction,
    pub confidence: f64,
    pub reasoning: String,
}

pub fn classify(inputs: &BarInputs) -> Classification {
    if inputs.is_insufficient() {
        return Classification {
            signal: SignalAction::Stay,
            confidence: 0.0,
            reasoning: "STAY: Insufficient data for signal generation".to_string(),
        };
    }

    let BarInputs {
        ma_short,
        ma_long,
        is_peak_zone,
        confidence,
        threshold,
        ..
    } = *inputs;

    let candidate = if ma_short > ma_long {
        SignalAction::Buy
    } else if ma_short < ma_long {
        SignalAction::Sell
    } else {
        SignalAction::Stay
    };

    let (signal, reasoning) = if confidence < threshold {
        (
            SignalAction::Stay,
            format!("STAY: Confidence too low ({confidence:.4} < {threshold:.4})"),
        )
    } else {
        match candidate {
            SignalAction::Sell if !is_peak_zone => (
                SignalAction::Stay,
                "STAY: Price not near recent peak".to_string(),
            ),
            SignalAction::Sell => (
                SignalAction::Sell,
                format!(
                    "SELL: Short MA crossed below Long MA with confidence {confidence:.4} \
                     (threshold: {threshold:.4}) and price near recent peak"
                ),
            ),
            SignalAction::Buy => (
                SignalAction::Buy,
                format!(
                    "BUY: Short MA crossed above Long MA with confidence {confidence:.4} \
                     (threshold: {threshold:.4})"
                ),
            ),
            SignalAction::Stay => (
                SignalAction::Stay,
                format!(
                    "STAY: Short MA equals Long MA (confidence {confidence:.4}, \
                     threshold: {threshold:.4})"
                ),
            ),
        }
    };

    Classification {
        signal,
        confidence,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(ma_short: f64, ma_long: f64, confidence: f64, threshold: f64) -> BarInputs {
        BarInputs {
            ma_short,
            ma_long,
            recent_max: 100.0,
            is_peak_zone: true,
            confidence,
            threshold,
        }
    }

    #[test]
    fn undefined_average_is_insufficient() {
        let mut i = inputs(10.0, 9.0, 0.1, 0.005);
        i.recent_max = f64::NAN;
        let c = classify(&i);
        assert_eq!(c.signal, SignalAction::Stay);
        assert_eq!(c.confidence, 0.0);
        assert!(c.reasoning.to_lowercase().contains("insufficient data"));
    }

    #[test]
    fn buy_above_threshold() {
        let c = classify(&inputs(10.0, 9.0, 0.111, 0.005));
        assert_eq!(c.signal, SignalAction::Buy);
        assert_eq!(
            c.reasoning,
            "BUY: Short MA crossed above Long MA with confidence 0.1110 (threshold: 0.0050)"
        );
    }

    #[test]
    fn low_confidence_downgrades_any_direction() {
        for (s, l) in [(10.0, 9.0), (9.0, 10.0)] {
            let c = classify(&inputs(s, l, 0.004, 0.005));
            assert_eq!(c.signal, SignalAction::Stay);
            assert_eq!(c.reasoning, "STAY: Confidence too low (0.0040 < 0.0050)");
        }
    }

    #[test]
    fn confidence_equal_to_threshold_passes() {
        let c = classify(&inputs(10.0, 9.0, 0.005, 0.005));
        assert_eq!(c.signal, SignalAction::Buy);
    }

    #[test]
    fn sell_needs_peak_zone() {
        let mut i = inputs(9.0, 10.0, 0.1, 0.005);
        assert_eq!(classify(&i).signal, SignalAction::Sell);
        assert!(classify(&i).reasoning.ends_with("and price near recent peak"));

        i.is_peak_zone = false;
        let c = classify(&i);
        assert_eq!(c.signal, SignalAction::Stay);
        assert!(c.reasoning.to_lowercase().contains("price not near recent peak"));
    }

    #[test]
    fn equal_averages_stay() {
        let c = classify(&inputs(10.0, 10.0, 0.0, 0.0));
        assert_eq!(c.signal, SignalAction::Stay);
        assert!(c.reasoning.starts_with("STAY: Short MA equals Long MA"));
    }
}
