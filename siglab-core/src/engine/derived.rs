use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::threshold::ThresholdMethod;

/// One bar plus everything the engine computed for it.
///
/// Undefined values are NaN. Never persisted; only the resulting
/// [`Signal`](crate::domain::Signal) is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub ma_short: f64,
    pub ma_long: f64,
    pub recent_max: f64,
    pub is_peak_zone: bool,
    pub confidence: f64,
    pub threshold_used: f64,
    pub threshold_method: ThresholdMethod,
}

impl DerivedBar {
    pub fn has_full_window(&self) -> bool {
        !(self.ma_short.is_nan() || self.ma_long.is_nan() || self.recent_max.is_nan())
    }
}
