use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{RepsError, number::format_number};

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*[–-]\s*([0-9]+)$").expect("valid range regex"));
static SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)$").expect("valid single regex"));

const PRESCRIPTION_KEYS: [&str; 2] = ["prescribed", "prescription"];

/// Bounded form of a reps value such as `8`, `"8"` or `"8-12"`.
///
/// When both bounds are present, `1 <= reps_low <= reps_high` holds. `reps_display` keeps the
/// value as written, even when the bounds had to be swapped.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NormalizedReps {
    pub reps_low: Option<u32>,
    pub reps_high: Option<u32>,
    pub reps_display: Option<String>,
    #[serde(rename = "isRange")]
    pub is_range: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RepsError>,
}

impl NormalizedReps {
    fn single(reps: u32, display: String) -> Self {
        let reps = reps.max(1);
        Self {
            reps_low: Some(reps),
            reps_high: Some(reps),
            reps_display: Some(display),
            is_range: false,
            error: None,
        }
    }

    fn range(a: u32, b: u32, display: String) -> Self {
        let (low, high) = if a > b { (b, a) } else { (a, b) };
        let (low, high) = (low.max(1), high.max(1));
        Self {
            reps_low: Some(low),
            reps_high: Some(high),
            reps_display: Some(display),
            is_range: low != high,
            error: None,
        }
    }

    fn invalid(error: RepsError, display: String) -> Self {
        Self {
            reps_display: Some(display),
            error: Some(error),
            ..Self::default()
        }
    }
}

fn parse_bound(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}

#[must_use]
pub fn normalize_reps(value: &Value) -> NormalizedReps {
    match value {
        Value::Null => NormalizedReps::default(),
        Value::Number(n) => match n.as_f64() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(f) => NormalizedReps::single(f.floor().max(1.0) as u32, format_number(f)),
            None => NormalizedReps::invalid(RepsError::UnsupportedType, n.to_string()),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(caps) = RANGE.captures(trimmed) {
                NormalizedReps::range(parse_bound(&caps[1]), parse_bound(&caps[2]), s.clone())
            } else if let Some(caps) = SINGLE.captures(trimmed) {
                NormalizedReps::single(parse_bound(&caps[1]), s.clone())
            } else {
                NormalizedReps::invalid(RepsError::MalformedString, s.clone())
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            NormalizedReps::invalid(RepsError::UnsupportedType, value.to_string())
        }
    }
}

/// Adds `reps_low`, `reps_high`, `reps_display` (and `reps_error`) next to an existing `reps`.
///
/// The `reps` field itself is left as it is. Prescriptions without `reps` are not touched.
pub fn normalize_prescription_reps(prescription: &mut Map<String, Value>) {
    let Some(reps) = prescription.get("reps") else {
        return;
    };

    let normalized = normalize_reps(reps);

    prescription.insert("reps_low".into(), normalized.reps_low.into());
    prescription.insert("reps_high".into(), normalized.reps_high.into());
    prescription.insert("reps_display".into(), normalized.reps_display.into());

    if let Some(error) = normalized.error {
        prescription.insert("reps_error".into(), error.to_string().into());
    }
}

#[must_use]
pub fn normalized_prescription_reps(prescription: &Map<String, Value>) -> Map<String, Value> {
    let mut prescription = prescription.clone();
    normalize_prescription_reps(&mut prescription);
    prescription
}

/// Normalizes the reps of every `prescribed` and `prescription` object of a plan's `exercises`.
pub fn normalize_session_plan_reps(plan: &mut Value) {
    let Some(exercises) = plan.get_mut("exercises").and_then(Value::as_array_mut) else {
        return;
    };

    for exercise in exercises {
        for key in PRESCRIPTION_KEYS {
            if let Some(Value::Object(prescription)) = exercise.get_mut(key) {
                normalize_prescription_reps(prescription);
            }
        }
    }
}

#[must_use]
pub fn normalized_session_plan_reps(plan: &Value) -> Value {
    let mut plan = plan.clone();
    normalize_session_plan_reps(&mut plan);
    plan
}
