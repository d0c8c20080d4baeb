//! Wall-clock helpers.

use chrono::{Local, Utc};

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Human-readable local timestamp carried by heartbeat frames,
/// e.g. `2024-01-02 15:04:05.123456 +0800`.
pub fn heartbeat_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f %z").to_string()
}
