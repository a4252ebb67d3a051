use serde_json::Value;

use crate::number::leading_int;

/// Parses `"ss"`, `"mm:ss"` or `"hh:mm:ss"` into seconds.
///
/// With more than three colon-separated parts only the last three are used. Any part without a
/// leading integer makes the whole text unparseable.
#[must_use]
pub fn parse_duration_to_seconds(text: &str) -> Option<u32> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok();
    }

    let parts = text.split(':').collect::<Vec<_>>();
    let seconds = match parts.as_slice() {
        [minutes, seconds] => part(minutes)? * 60 + part(seconds)?,
        [.., hours, minutes, seconds] => part(hours)? * 3600 + part(minutes)? * 60 + part(seconds)?,
        _ => return None,
    };

    u32::try_from(seconds).ok()
}

fn part(text: &str) -> Option<i128> {
    leading_int(text).map(i128::from)
}

/// Same as [`parse_duration_to_seconds`] for a JSON value (number, string or `null`).
#[must_use]
pub fn duration_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => parse_duration_to_seconds(s),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Formats seconds as zero-padded `hh:mm:ss`; hours are not wrapped at 24.
#[must_use]
pub fn seconds_to_hhmmss(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| !s.is_nan()) else {
        return String::new();
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0).floor() as u64;

    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        total % 3600 / 60,
        total % 60
    )
}
