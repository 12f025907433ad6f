//! Time formatting helpers for reports and log output.

use chrono::{DateTime, Utc};

use pemilu_types::Timestamp;

/// Format a duration in whole seconds as a compact human string.
pub fn format_duration(secs: u64) -> String {
    let (days, rem) = (secs / 86400, secs % 86400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let (mins, secs) = (rem / 60, rem % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Render a timestamp as a readable UTC string for reports.
pub fn format_utc(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts.as_secs() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{}s", ts.as_secs()))
}

/// Render a timestamp as RFC 3339, the form stored in export metadata.
pub fn format_rfc3339(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts.as_secs() as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{}s", ts.as_secs()))
}
