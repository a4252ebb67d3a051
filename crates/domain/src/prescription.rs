use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ExerciseKey, MultiplierError, number::first_number};

/// Upper bound for the number of rows emitted for a single exercise.
pub const MAX_SETS: usize = 999;

pub(crate) static PER_SIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)per\s*hand|each|per\s*side|x2|×2").expect("valid per side regex")
});
pub(crate) static BODYWEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)bodyweight").expect("valid bodyweight regex"));
static TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)total").expect("valid total regex"));

/// Rows per exercise, in the order the exercises first appear in the source document.
pub type PrescriptionsByExercise = IndexMap<ExerciseKey, Vec<PrescriptionRow>>;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRow {
    pub set: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<Multiplier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

impl PrescriptionRow {
    /// External load actually moved in this set, if a weight is prescribed.
    #[must_use]
    pub fn effective_load(&self) -> Option<f64> {
        self.weight.map(|weight| match self.multiplier {
            Some(multiplier) => weight * multiplier.factor(),
            None => weight,
        })
    }
}

/// How a prescribed weight relates to the load actually moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Multiplier {
    /// No external load.
    Bodyweight = 0,
    /// The weight is the total load.
    Total = 1,
    /// The weight is held in each hand or applies to each side.
    PerSide = 2,
}

impl Multiplier {
    #[must_use]
    pub fn factor(self) -> f64 {
        f64::from(u8::from(self))
    }
}

impl From<Multiplier> for u8 {
    fn from(value: Multiplier) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Multiplier {
    type Error = MultiplierError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Multiplier::Bodyweight),
            1 => Ok(Multiplier::Total),
            2 => Ok(Multiplier::PerSide),
            _ => Err(MultiplierError::Unknown(value)),
        }
    }
}

/// Weight and multiplier read from a value like `40`, `"27.5 lb per hand"` or `"bodyweight"`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WeightSpec {
    pub weight: Option<f64>,
    pub multiplier: Option<Multiplier>,
}

impl WeightSpec {
    #[must_use]
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self {
                weight: n.as_f64(),
                multiplier: None,
            },
            Value::String(s) => Self::parse_str(s),
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn parse_str(text: &str) -> Self {
        let text = text.to_lowercase();
        let multiplier = if PER_SIDE.is_match(&text) {
            Some(Multiplier::PerSide)
        } else if TOTAL.is_match(&text) {
            Some(Multiplier::Total)
        } else if BODYWEIGHT.is_match(&text) {
            Some(Multiplier::Bodyweight)
        } else {
            None
        };
        Self {
            weight: first_number(&text),
            multiplier,
        }
    }
}

/// Values shared by every row of one exercise.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct RowTemplate {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub multiplier: Option<Multiplier>,
    pub rpe: Option<f64>,
    pub time_seconds: Option<u32>,
    pub hold_seconds: Option<u32>,
    pub distance_meters: Option<f64>,
    pub distance_miles: Option<f64>,
    pub angle: Option<f64>,
}

impl RowTemplate {
    /// Whether anything worth logging was prescribed; a multiplier or angle alone is not.
    pub fn has_target(&self) -> bool {
        self.reps.is_some()
            || self.weight.is_some()
            || self.rpe.is_some()
            || self.time_seconds.is_some()
            || self.hold_seconds.is_some()
            || self.distance_meters.is_some()
            || self.distance_miles.is_some()
    }

    pub fn apply_weight(&mut self, spec: WeightSpec) {
        if spec.weight.is_some() {
            self.weight = spec.weight;
        }
        if spec.multiplier.is_some() {
            self.multiplier = spec.multiplier;
        }
    }

    pub fn rows(&self, count: usize) -> Vec<PrescriptionRow> {
        (1..=count.min(MAX_SETS))
            .map(|set| PrescriptionRow {
                set: u32::try_from(set).unwrap_or(u32::MAX),
                reps: self.reps,
                weight: self.weight,
                multiplier: self.multiplier,
                rpe: self.rpe,
                time_seconds: self.time_seconds,
                hold_seconds: self.hold_seconds,
                distance_meters: self.distance_meters,
                distance_miles: self.distance_miles,
                angle: self.angle,
            })
            .collect()
    }
}
