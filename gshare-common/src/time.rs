//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as milliseconds since the Unix epoch
///
/// Media index date columns are stored in this unit.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
