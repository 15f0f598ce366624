//! Timestamp helpers shared by entities, mappers and specifications.
//!
//! Instants are kept at millisecond precision, which is what the storage
//! format holds, so an entity read back from storage compares equal to the
//! one that was written.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

use crate::error::{PantryError, Result};

pub const DAY_MS: i64 = 86_400_000;

/// `0001-01-01T00:00:00.000Z`, the earliest instant an entity may hold.
const EARLIEST_MS: i64 = -62_135_596_800_000;

/// `0000-01-01T00:00:00.000Z`, the earliest query bound.
const BOUND_FLOOR_MS: i64 = -62_167_219_200_000;

/// `9999-12-31T23:59:59.999Z`. Later instants lose the four digit year in
/// storage text and stop sorting in time order.
const LATEST_MS: i64 = 253_402_300_799_999;

/// Current instant truncated to milliseconds.
pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

pub fn truncate(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// Pull `instant` into the range storage text sorts correctly.
pub fn clamp(instant: DateTime<Utc>) -> DateTime<Utc> {
    from_millis(instant.timestamp_millis().clamp(EARLIEST_MS, LATEST_MS), instant)
}

/// `instant` moved by `days` whole days, saturating at the storable range
/// instead of overflowing.
pub fn add_days(instant: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let ms = instant
        .timestamp_millis()
        .saturating_add(days.saturating_mul(DAY_MS));
    from_millis(ms.clamp(BOUND_FLOOR_MS, LATEST_MS), instant)
}

fn from_millis(ms: i64, fallback: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(fallback)
}

/// Timestamp for a mutation: never earlier than, nor equal to, `previous`.
pub fn next_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let current = now();
    let floor = previous + Duration::milliseconds(1);
    if current < floor {
        floor
    } else {
        current
    }
}

/// Canonical sortable text form, e.g. `2025-01-15T10:00:00.000Z`.
pub fn to_storage(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn from_storage(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|e| PantryError::validation(format!("invalid timestamp '{}': {}", value, e)))
}
