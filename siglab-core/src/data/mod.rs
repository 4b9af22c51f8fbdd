//! Bar ingestion, cleaning and validation

pub mod canonicalize;
pub mod schema;
pub mod series;
pub mod timestamp;

pub use canonicalize::Canonicalizer;
pub use schema::{BarSchema, ColumnMap};
pub use series::{BarSeries, CleaningReport, RawBar};
pub use timestamp::parse_timestamp;
