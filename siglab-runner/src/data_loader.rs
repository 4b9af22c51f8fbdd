//! CSV bar loading.
//!
//! Headers are resolved through [`BarSchema`], so provider-style exports
//! (`Date,Open,High,Low,Close,Adj Close,Volume`) load without renaming.
//! Unparseable cells become nulls and the row is dropped during cleaning.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use siglab_core::data::{parse_timestamp, BarSchema, RawBar};
use siglab_core::{Bar, BarSeries, EngineError};

use crate::config::is_safe_ticker;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar file for '{ticker}' at {path}")]
    Missing { ticker: String, path: PathBuf },

    #[error("read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("ticker '{ticker}' cannot name a bar file")]
    InvalidTicker { ticker: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// `{dir}/{TICKER}.csv`. The ticker must be a single path component.
pub fn csv_path(dir: &Path, ticker: &str) -> Result<PathBuf, LoadError> {
    if !is_safe_ticker(ticker) {
        return Err(LoadError::InvalidTicker {
            ticker: ticker.to_string(),
        });
    }
    Ok(dir.join(format!("{ticker}.csv")))
}

/// Load and clean one ticker's CSV file.
pub fn load_csv(path: &Path, ticker: &str) -> Result<BarSeries, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing {
            ticker: ticker.to_string(),
            path: path.to_path_buf(),
        });
    }
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    read_bars(reader, ticker).map_err(|e| match e {
        ReadError::Csv(source) => LoadError::Csv {
            path: path.to_path_buf(),
            source,
        },
        ReadError::Engine(e) => LoadError::Engine(e),
    })
}

/// Parse bars from any CSV byte source.
pub fn parse_csv<R: Read>(input: R, ticker: &str) -> Result<BarSeries, LoadError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    read_bars(reader, ticker).map_err(|e| match e {
        ReadError::Csv(source) => LoadError::Csv {
            path: PathBuf::from("<input>"),
            source,
        },
        ReadError::Engine(e) => LoadError::Engine(e),
    })
}

enum ReadError {
    Csv(csv::Error),
    Engine(EngineError),
}

fn read_bars<R: Read>(mut reader: csv::Reader<R>, ticker: &str) -> Result<BarSeries, ReadError> {
    let headers = reader.headers().map_err(ReadError::Csv)?.clone();
    let names: Vec<&str> = headers.iter().collect();
    let map = BarSchema::resolve(&names).map_err(ReadError::Engine)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(ReadError::Csv)?;
        let num = |idx: usize| record.get(idx).and_then(|v| v.parse::<f64>().ok());
        rows.push(RawBar {
            timestamp: record.get(map.timestamp).and_then(parse_timestamp),
            open: num(map.open),
            high: num(map.high),
            low: num(map.low),
            close: num(map.close),
            volume: num(map.volume),
        });
    }
    debug!(ticker, rows = rows.len(), "csv rows read");
    BarSeries::from_raw(ticker, rows).map_err(ReadError::Engine)
}

/// Write bars as a canonical CSV (`timestamp,open,high,low,close,volume`).
pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(BarSchema::REQUIRED)?;
    for bar in bars {
        writer.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDER_CSV: &str = "\
Datetime,Open,High,Low,Close,Volume,Dividends
2024-05-01 09:30:00,10,11,9,10.5,1000,0
2024-05-01 09:35:00,10.5,11,10,10.8,1200,0
2024-05-01 09:40:00,10.8,11.2,10.6,,900,0
2024-05-01 09:35:00,99,99,99,99,1,0
2024-05-01T09:45:00Z,10.9,11.5,10.7,11.1,1500,0
";

    #[test]
    fn provider_headers_and_dirty_rows() {
        let series = parse_csv(PROVIDER_CSV.as_bytes(), "XYZ").unwrap();
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.5, 10.8, 11.1]);
        assert_eq!(series.report().dropped_null, 1);
        assert_eq!(series.report().dropped_duplicate, 1);
    }

    #[test]
    fn missing_volume_column() {
        let csv = "timestamp,open,high,low,close\n2024-05-01,1,1,1,1\n";
        let err = parse_csv(csv.as_bytes(), "XYZ").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Engine(EngineError::Validation { ref field, .. }) if field == "volume"
        ));
    }

    #[test]
    fn missing_file() {
        let err = load_csv(Path::new("/nonexistent/XYZ.csv"), "XYZ").unwrap_err();
        assert!(matches!(err, LoadError::Missing { .. }));
    }

    #[test]
    fn bar_path_stays_inside_data_dir() {
        let dir = Path::new("/data/bars");
        assert_eq!(csv_path(dir, "BRK.B").unwrap(), dir.join("BRK.B.csv"));
        for bad in ["../escaped", "BRK/B", ""] {
            assert!(matches!(
                csv_path(dir, bad),
                Err(LoadError::InvalidTicker { .. })
            ));
        }
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let series = parse_csv(PROVIDER_CSV.as_bytes(), "XYZ").unwrap();
        let path = csv_path(dir.path(), "XYZ").unwrap();
        write_csv(&path, series.bars()).unwrap();
        let loaded = load_csv(&path, "XYZ").unwrap();
        assert_eq!(loaded.bars(), series.bars());
    }
}
