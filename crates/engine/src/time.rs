use crate::error::{EngineError, Result};

/// Formats playback seconds as `m:ss` for the current-time readouts.
///
/// Fractions are truncated; negative and non-finite values render as `0:00`.
///
/// # Example
/// ```
/// use engine::format_time;
///
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(65.9), "1:05");
/// assert_eq!(format_time(3_600.0), "60:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}

/// Formats a caption time field with one decimal place.
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.1}")
}

/// Formats the span between two caption times, e.g. `5.0s`.
pub fn format_duration(start: f64, end: f64) -> String {
    format!("{:.1}s", end - start)
}

/// Parses a caption time field typed by the user.
///
/// Bounds and ordering are not checked; only input that is not a finite
/// decimal number is rejected.
///
/// # Example
/// ```
/// use engine::parse_seconds;
///
/// assert_eq!(parse_seconds(" 12.5 ").expect("valid"), 12.5);
/// assert!(parse_seconds("abc").is_err());
/// ```
pub fn parse_seconds(input: &str) -> Result<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| EngineError::InvalidTimeInput {
            input: input.to_owned(),
        })
}
