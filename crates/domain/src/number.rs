use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").expect("valid number regex"));
static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("valid integer regex"));

/// Coerces a loosely typed value into a finite number.
///
/// Numbers pass through, booleans become 0 or 1, strings are parsed after trimming (an empty
/// string counts as 0). `null`, arrays and objects have no numeric meaning here.
#[must_use]
pub fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    number.filter(|n| n.is_finite())
}

/// The first unsigned decimal number found anywhere in the text.
#[must_use]
pub fn first_number(text: &str) -> Option<f64> {
    FIRST_NUMBER
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Leading integer of the text, ignoring anything after it ("12abc" is 12).
#[must_use]
pub fn leading_int(text: &str) -> Option<i64> {
    LEADING_INT
        .captures(text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

/// Integer part of a value, for numbers and numeric-prefixed strings.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn integer_part(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

/// Non-negative integer count, floored. Negative and non-finite values have no count.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_count(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 {
        Some(value.floor() as u32)
    } else {
        None
    }
}

#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Shortest textual form of a number: `8` rather than `8.0`, `27.5` stays `27.5`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::from("NaN")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value == 0.0 {
        String::from("0")
    } else {
        format!("{value}")
    }
}

/// Truthiness of a loosely typed value: `null`, `false`, `0` and `""` are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a scalar value, as used when a name or title is not a string.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        other => other.to_string(),
    }
}
