//! Type aliases and time helpers for the reward engine.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{TimeZone, Utc};

pub type UserId = String;
pub type UnixMillis = i64;

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Current wall-clock time in unix milliseconds.
pub fn now_ms() -> UnixMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}

/// UTC calendar-day key (`YYYY-MM-DD`) for a unix-millisecond timestamp.
///
/// Day boundaries sit at UTC midnight: a grant at 23:59:59 and another at
/// 00:00:01 the next day land on different keys even though only seconds
/// elapsed.
pub fn day_key(at_ms: UnixMillis) -> String {
    match Utc.timestamp_millis_opt(at_ms).single() {
        Some(moment) => moment.format("%Y-%m-%d").to_string(),
        None => "1970-01-01".to_string(),
    }
}

/// Day key for the UTC calendar day immediately before `at_ms`.
pub fn previous_day_key(at_ms: UnixMillis) -> String {
    day_key(at_ms.saturating_sub(MILLIS_PER_DAY))
}
