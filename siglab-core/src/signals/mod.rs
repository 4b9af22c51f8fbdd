//! Per-bar signal math: moving averages and confidence, peak zone, and the
//! final BUY / SELL / STAY decision.
//!
//! Everything here is a pure function of the bar history. Nothing reads
//! prior signals or persisted state.

pub mod classifier;
pub mod confidence;
pub mod peak;

pub use classifier::{classify, BarInputs, Classification};
pub use confidence::{effective_windows, MaCrossover, MovingAverageCalculator};
pub use peak::{PeakZone, PeakZoneDetector};
