//! Clock helpers shared across the workspace

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Current UTC time, truncated to millisecond precision.
///
/// Stored timestamps round-trip through JSON documents; keeping them at
/// millisecond granularity keeps equality stable across that round trip.
pub fn utc_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(Duration::milliseconds(1)).unwrap_or(now)
}
