//! Duration formatting for SCION service configuration.
//!
//! The control service reads durations in Go notation such as "5s" or
//! "500ms". Durations are written as a single integer in the largest unit
//! that represents them exactly.

use std::time::Duration;

const UNITS: [(&str, u128); 6] = [
    ("h", 3_600_000_000_000),
    ("m", 60_000_000_000),
    ("s", 1_000_000_000),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

/// Format a duration as `<n><unit>` using the largest exact unit
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use sciontopo::utils::duration::format_scion_duration;
///
/// assert_eq!(format_scion_duration(Duration::from_secs(120)), "2m");
/// assert_eq!(format_scion_duration(Duration::from_millis(1500)), "1500ms");
/// ```
pub fn format_scion_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    for (unit, size) in UNITS {
        if nanos % size == 0 {
            return format!("{}{}", nanos / size, unit);
        }
    }
    format!("{}ns", nanos)
}
