//! Minute alignment — how long to sleep so the next wake-up lands on `:00`.

use std::time::Duration;

use chrono::Timelike;

/// Seconds until the start of the next minute: `60 - current_seconds`.
/// Always between 1s and 60s, so the loop advances even when called exactly
/// on a boundary.
pub fn until_next_minute(now: &impl Timelike) -> Duration {
    Duration::from_secs(u64::from(60 - now.second().min(59)))
}
