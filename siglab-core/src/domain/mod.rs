//! Domain types for siglab

pub mod bar;
pub mod signal;

pub use bar::Bar;
pub use signal::{Signal, SignalAction, SignalType};

/// Ticker type alias
pub type Ticker = String;
