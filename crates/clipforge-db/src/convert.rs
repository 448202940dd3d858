//! Column value conversions.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{DbError, DbResult};

pub(crate) fn to_millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::invalid_data(format!("timestamp out of range: {}", ms)))
}

pub(crate) fn to_u32(value: i64, column: &str) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::invalid_data(format!("{} out of range: {}", column, value)))
}

pub(crate) fn parse_column<T>(value: &str, column: &str) -> DbResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DbError::invalid_data(format!("{}: {}", column, e)))
}
