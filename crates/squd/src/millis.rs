//! Millisecond narrowing for log fields and error payloads.

use std::time::Duration;

/// Returns `duration` in whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
