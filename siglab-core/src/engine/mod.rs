//! Signal engine: bar series in, signal series out.
//!
//! One invocation processes one ticker end-to-end:
//!
//! 1. moving averages and confidence (windows rescaled for short series)
//! 2. rolling max and peak-zone flag
//! 3. per-bar threshold from each requested policy
//! 4. classification into BUY / SELL / STAY
//!
//! The engine holds no state between invocations and performs no I/O.

pub mod config;
pub mod derived;
pub mod pipeline;

pub use config::{EngineConfig, Emission};
pub use derived::DerivedBar;
pub use pipeline::{EngineRun, SignalEngine};
