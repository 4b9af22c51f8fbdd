//! DataFrame ingestion: polars frame -> `BarSeries`.
//!
//! Columns are resolved through `BarSchema` (case-insensitive, with aliases),
//! numeric columns are cast to Float64 (unparseable cells become null), and the
//! timestamp column may be Datetime, Date, String or integer epoch milliseconds.

use chrono::NaiveDateTime;
use polars::prelude::*;

use super::schema::BarSchema;
use super::series::{BarSeries, RawBar};
use super::timestamp::{
    from_epoch_micros, from_epoch_millis, from_epoch_nanos, parse_timestamp,
};
use crate::error::EngineError;

/// Canonicalizer for bar data
pub struct Canonicalizer;

impl Canonicalizer {
    /// Resolve, coerce, and clean a DataFrame into a validated series.
    pub fn from_dataframe(ticker: &str, df: &DataFrame) -> Result<BarSeries, EngineError> {
        let rows = Self::raw_rows(df)?;
        BarSeries::from_raw(ticker, rows)
    }

    /// Resolve and coerce columns without cleaning.
    pub fn raw_rows(df: &DataFrame) -> Result<Vec<RawBar>, EngineError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let headers: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let map = BarSchema::resolve(&headers)?;

        let timestamps = timestamp_values(column(df, &names[map.timestamp], "timestamp")?)?;
        let open = float_values(column(df, &names[map.open], "open")?, "open")?;
        let high = float_values(column(df, &names[map.high], "high")?, "high")?;
        let low = float_values(column(df, &names[map.low], "low")?, "low")?;
        let close = float_values(column(df, &names[map.close], "close")?, "close")?;
        let volume = float_values(column(df, &names[map.volume], "volume")?, "volume")?;

        Ok((0..df.height())
            .map(|i| RawBar {
                timestamp: timestamps[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            })
            .collect())
    }
}

fn column<'a>(df: &'a DataFrame, name: &str, field: &str) -> Result<&'a Series, EngineError> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|e| EngineError::validation(field, e.to_string()))
}

fn float_values(series: &Series, field: &str) -> Result<Vec<Option<f64>>, EngineError> {
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| EngineError::validation(field, format!("not numeric: {e}")))?;
    let values = cast
        .f64()
        .map_err(|e| EngineError::validation(field, e.to_string()))?;
    Ok(values.into_iter().collect())
}

fn timestamp_values(series: &Series) -> Result<Vec<Option<NaiveDateTime>>, EngineError> {
    let invalid = |e: PolarsError| EngineError::validation("timestamp", e.to_string());

    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let convert: fn(i64) -> Option<NaiveDateTime> = match unit {
                TimeUnit::Milliseconds => from_epoch_millis,
                TimeUnit::Microseconds => from_epoch_micros,
                TimeUnit::Nanoseconds => from_epoch_nanos,
            };
            let ints = series.cast(&DataType::Int64).map_err(invalid)?;
            let values = ints.i64().map_err(invalid)?;
            Ok(values.into_iter().map(|v| v.and_then(convert)).collect())
        }
        DataType::Date => {
            let days = series.cast(&DataType::Int32).map_err(invalid)?;
            let values = days.i32().map_err(invalid)?;
            Ok(values
                .into_iter()
                .map(|v| v.and_then(|d| from_epoch_millis(i64::from(d) * 86_400_000)))
                .collect())
        }
        DataType::String => {
            let values = series.str().map_err(invalid)?;
            Ok(values
                .into_iter()
                .map(|v| v.and_then(parse_timestamp))
                .collect())
        }
        dt if dt.is_integer() => {
            let ints = series.cast(&DataType::Int64).map_err(invalid)?;
            let values = ints.i64().map_err(invalid)?;
            Ok(values
                .into_iter()
                .map(|v| v.and_then(from_epoch_millis))
                .collect())
        }
        other => Err(EngineError::validation(
            "timestamp",
            format!("unsupported column type {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_sorts_and_dedupes() {
        let df = df!(
            "timestamp" => &[3i64, 1, 2, 1],
            "open" => &[100.0, 100.0, 100.0, 101.0],
            "high" => &[105.0, 105.0, 105.0, 106.0],
            "low" => &[99.0, 99.0, 99.0, 99.0],
            "close" => &[103.0, 101.0, 102.0, 104.0],
            "volume" => &[1000.0, 1000.0, 1000.0, 2000.0],
        )
        .unwrap();

        let series = Canonicalizer::from_dataframe("SPY", &df).unwrap();
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        // First occurrence of timestamp 1 is kept.
        assert_eq!(closes, vec![101.0, 102.0, 103.0]);
    }

    #[test]
    fn renames_provider_columns() {
        let df = df!(
            "Datetime" => &["2024-01-02 09:30:00", "2024-01-02 09:35:00"],
            "Open" => &[100.0, 101.0],
            "High" => &[101.0, 102.0],
            "Low" => &[99.0, 100.0],
            "Close" => &[100.5, 101.5],
            "Volume" => &[1000i64, 1200],
            "Dividends" => &[0.0, 0.0],
        )
        .unwrap();

        let series = Canonicalizer::from_dataframe("AAPL", &df).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].volume, 1200.0);
        assert_eq!(
            series.bars()[0].timestamp,
            parse_timestamp("2024-01-02 09:30:00").unwrap()
        );
    }

    #[test]
    fn null_rows_are_dropped() {
        let df = df!(
            "timestamp" => &[1i64, 2, 3],
            "open" => &[Some(100.0), None, Some(100.0)],
            "high" => &[105.0, 105.0, 105.0],
            "low" => &[99.0, 99.0, 99.0],
            "close" => &[103.0, 103.0, 103.0],
            "volume" => &[1000.0, 1000.0, 1000.0],
        )
        .unwrap();

        let series = Canonicalizer::from_dataframe("SPY", &df).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.report().dropped_null, 1);
    }

    #[test]
    fn missing_column_is_a_validation_error() {
        let df = df!(
            "timestamp" => &[1i64],
            "open" => &[400.0],
            "high" => &[405.0],
        )
        .unwrap();

        let err = Canonicalizer::from_dataframe("SPY", &df).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "low"));
    }
}
