//! Timestamp parsing for text and integer bar sources.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
];

/// Smallest integer accepted as epoch milliseconds (1973-03-03T09:46:40Z).
pub const MIN_EPOCH_MILLIS: i64 = 100_000_000_000;

/// Parse a timestamp cell. Offset-aware values are converted to naive UTC.
///
/// Accepts RFC 3339, common naive layouts, bare dates (midnight), and integer
/// epoch milliseconds of at least [`MIN_EPOCH_MILLIS`] in magnitude. Shorter
/// digit strings such as the compact date `20240102` are rejected. Returns
/// `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    s.parse::<i64>()
        .ok()
        .filter(|ms| ms.unsigned_abs() >= MIN_EPOCH_MILLIS.unsigned_abs())
        .and_then(from_epoch_millis)
}

/// Epoch milliseconds to naive UTC.
pub fn from_epoch_millis(ms: i64) -> Option<NaiveDateTime> {
    from_epoch_parts(ms.div_euclid(1_000), ms.rem_euclid(1_000) * 1_000_000)
}

/// Epoch microseconds to naive UTC.
pub fn from_epoch_micros(us: i64) -> Option<NaiveDateTime> {
    from_epoch_parts(us.div_euclid(1_000_000), us.rem_euclid(1_000_000) * 1_000)
}

/// Epoch nanoseconds to naive UTC.
pub fn from_epoch_nanos(ns: i64) -> Option<NaiveDateTime> {
    from_epoch_parts(ns.div_euclid(1_000_000_000), ns.rem_euclid(1_000_000_000))
}

fn from_epoch_parts(secs: i64, nanos: i64) -> Option<NaiveDateTime> {
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}
