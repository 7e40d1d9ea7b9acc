//! Human-readable uptime strings for the status payload.

use core::fmt::Write;

/// Large enough for `u64::MAX` milliseconds ("213503982334 days and 14:25:51").
pub type UptimeString = heapless::String<48>;

/// Format elapsed milliseconds as `H:M:S`, or `D days and H:M:S` once a
/// full day has passed.  Fields are not zero-padded.
pub fn format_uptime(ms: u64) -> UptimeString {
    let total_secs = ms / 1000;
    let total_mins = total_secs / 60;
    let total_hours = total_mins / 60;
    let days = total_hours / 24;

    let secs = total_secs % 60;
    let mins = total_mins % 60;
    let hours = total_hours % 24;

    let mut out = UptimeString::new();
    // Capacity covers the widest possible input.
    let _ = if days > 0 {
        write!(out, "{days} days and {hours}:{mins}:{secs}")
    } else {
        write!(out, "{hours}:{mins}:{secs}")
    };
    out
}
