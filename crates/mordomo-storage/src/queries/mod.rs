// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per entity family.

pub mod actors;
pub mod attendance;
pub mod confirmations;
pub mod processed;
pub mod records;
pub mod shopping;
pub mod suggestions;

use chrono::{DateTime, SecondsFormat, Utc};

/// Canonical timestamp format for all stored timestamps.
///
/// Millisecond precision with a literal `Z` suffix, matching SQLite's
/// `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`, so stored values compare
/// correctly both lexicographically and after parsing.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored value into `T`, mapping failures to a rusqlite
/// conversion error so they surface through the normal query error path.
pub(crate) fn parse_col<T>(idx: usize, raw: String) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fmt_ts_uses_millis_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        assert_eq!(fmt_ts(ts), "2026-03-02T08:30:00.000Z");
    }

    #[test]
    fn fmt_ts_round_trips_through_parse_col() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        let parsed: DateTime<Utc> = parse_col(0, fmt_ts(ts)).unwrap();
        assert_eq!(parsed, ts);
    }
}
