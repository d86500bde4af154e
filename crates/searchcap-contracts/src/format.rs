//! Human-readable renderings used in violation messages.

use std::time::Duration;

/// Bytes per megabyte (1024 * 1024).
pub const MEGABYTE: u64 = 1_048_576;

/// Render a millisecond duration as `HH:MM:SS`.
///
/// Sub-second remainders are truncated. Hours are zero-padded to two digits
/// but never clipped.
pub fn format_hms(millis: u64) -> String {
    let secs = millis / 1000;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// `format_hms` for a `Duration`.
pub fn format_duration(d: Duration) -> String {
    format_hms(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Render a byte count as whole megabytes, e.g. `90MB`.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{}MB", bytes / MEGABYTE)
}
