//! Bar column schema and header resolution.
//!
//! Providers disagree on column names (`Datetime`, `Adj Close`, `Vol`, ...).
//! Headers are matched case-insensitively, exact names first, aliases second.

use crate::error::EngineError;

/// Expected schema for bar data.
pub struct BarSchema;

/// Position of each required field in the source header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
}

impl BarSchema {
    /// Required fields, in canonical order.
    pub const REQUIRED: [&'static str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

    /// Alias -> canonical name. Only consulted when the canonical column is absent.
    const ALIASES: [(&'static str, &'static str); 6] = [
        ("datetime", "timestamp"),
        ("date", "timestamp"),
        ("adj close", "close"),
        ("adj_close", "close"),
        ("vol", "volume"),
        ("time", "timestamp"),
    ];

    /// Resolve the required fields against a header row.
    ///
    /// Fails with a validation error naming the first missing field.
    pub fn resolve(headers: &[&str]) -> Result<ColumnMap, EngineError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let find = |field: &str| -> Result<usize, EngineError> {
            if let Some(idx) = normalized.iter().position(|h| h == field) {
                return Ok(idx);
            }
            Self::ALIASES
                .iter()
                .filter(|(_, canonical)| *canonical == field)
                .find_map(|(alias, _)| normalized.iter().position(|h| h == alias))
                .ok_or_else(|| EngineError::validation(field, "missing required column"))
        };

        Ok(ColumnMap {
            timestamp: find("timestamp")?,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_headers() {
        let map =
            BarSchema::resolve(&["timestamp", "open", "high", "low", "close", "volume"]).unwrap();
        assert_eq!(map.timestamp, 0);
        assert_eq!(map.volume, 5);
    }

    #[test]
    fn resolves_provider_style_headers() {
        let map = BarSchema::resolve(&[
            "Datetime", "Open", "High", "Low", "Close", "Volume", "Dividends",
        ])
        .unwrap();
        assert_eq!(map.timestamp, 0);
        assert_eq!(map.close, 4);
    }

    #[test]
    fn adj_close_only_used_without_close() {
        let map =
            BarSchema::resolve(&["Date", "Open", "High", "Low", "Close", "Adj Close", "Vol"])
                .unwrap();
        assert_eq!(map.close, 4);
        assert_eq!(map.volume, 6);

        let map =
            BarSchema::resolve(&["Date", "Open", "High", "Low", "Adj Close", "Volume"]).unwrap();
        assert_eq!(map.close, 4);
    }

    #[test]
    fn missing_column_names_the_field() {
        let err = BarSchema::resolve(&["timestamp", "open", "high", "low", "volume"]).unwrap_err();
        match err {
            EngineError::Validation { field, .. } => assert_eq!(field, "close"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
