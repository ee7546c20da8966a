//! Database query modules.
//!
//! - videos: video record CRUD keyed by file path
//! - subtitles: subtitle artifacts per video
//! - metadata: merged metadata and raw provider payloads per video

pub mod metadata;
pub mod subtitles;
pub mod videos;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Wrap a value-conversion failure for column `idx` as a rusqlite error.
pub(crate) fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Parse a JSON text column.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    value: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| conversion_error(idx, e))
}
