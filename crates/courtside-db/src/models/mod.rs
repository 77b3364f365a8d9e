//! Database models for persistent storage.

mod activity;
mod user;

pub use activity::*;
pub use user::*;

use chrono::{DateTime, TimeZone, Utc};

/// Timestamps are stored as unix epoch milliseconds.
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
