//! Human-readable rendering of sizes, counts and timestamps.

use std::time::SystemTime;

use chrono::{DateTime, Local};

const BYTE_UNITS: &[&str] = &["b", "Kb", "Mb", "Gb", "Tb", "Pb", "Eb", "Zb", "Yb"];

/// Formats a byte count with up to two decimals, e.g. `"1.5 Kb"`.
pub fn byte_size(bytes: u64) -> String {
    byte_size_with(bytes, 2)
}

/// Formats a byte count by repeated division by 1024.
///
/// The value is rounded to `decimals` places and trailing zeros are dropped,
/// so `1024` renders as `"1 Kb"` rather than `"1.00 Kb"`. A `decimals` of zero
/// falls back to two places.
pub fn byte_size_with(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 b".to_string();
    }
    let decimals = if decimals == 0 { 2 } else { decimals };

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.decimals$}");
    let trimmed = if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.')
    } else {
        rounded.as_str()
    };
    format!("{trimmed} {}", BYTE_UNITS[unit])
}

/// Builds a counted noun phrase: `"1 item"`, `"3 items"`.
pub fn noun(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Formats a timestamp as `Jan/05/2024`, optionally followed by `03:07 PM`.
pub fn date_string(time: SystemTime, with_time: bool) -> String {
    format_local(DateTime::<Local>::from(time), with_time)
}

fn format_local(date: DateTime<Local>, with_time: bool) -> String {
    if with_time {
        date.format("%b/%d/%Y %I:%M %p").to_string()
    } else {
        date.format("%b/%d/%Y").to_string()
    }
}
