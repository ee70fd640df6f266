//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Frame interval for a given frame rate
///
/// Rates of zero (or below one frame per second) clamp to one second.
pub fn frame_interval(fps: u32) -> std::time::Duration {
    if fps == 0 {
        return std::time::Duration::from_secs(1);
    }
    std::time::Duration::from_micros(1_000_000 / u64::from(fps))
}
