//! Timestamp encoding for the text `DATETIME` columns.

use chrono::{DateTime, SecondsFormat, Utc};

use super::errors::{Result, StorageError};

/// Encode an instant as RFC 3339 UTC with second precision, e.g. `2024-05-01T12:00:00Z`.
///
/// The fixed width keeps lexical order equal to chronological order.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp, surfacing failures instead of defaulting.
pub(crate) fn decode_timestamp(value: &str, context: impl Into<String>) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::Encoding {
            context: context.into(),
            value: value.to_string(),
            message: e.to_string(),
        })
}
