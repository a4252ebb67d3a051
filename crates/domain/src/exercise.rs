use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::number::{is_truthy, to_count, to_number, value_text};

/// One entry of a session plan's `exercises`.
///
/// Fields that are not interpreted here are kept in `extra` and written back unchanged.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(
        default,
        deserialize_with = "name_text",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescribed: Option<Prescribed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<Prescribed>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlanExercise {
    /// `prescribed`, or `prescription` for plans using the older field name.
    #[must_use]
    pub fn active_prescription(&self) -> Option<&Prescribed> {
        self.prescribed.as_ref().or(self.prescription.as_ref())
    }

    pub fn active_prescription_mut(&mut self) -> Option<&mut Prescribed> {
        match self.prescribed {
            Some(ref mut prescribed) => Some(prescribed),
            None => self.prescription.as_mut(),
        }
    }

    /// The name if set, the slug otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.slug.as_deref().unwrap_or_default()
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescribed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<Value>,
    #[serde(
        default,
        rename = "priorWeekRPE",
        skip_serializing_if = "Option::is_none"
    )]
    pub prior_week_rpe: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Prescribed {
    /// Numeric `weight`, or numeric `load` if the weight is missing or not a number.
    #[must_use]
    pub fn load(&self) -> Option<f64> {
        numeric(self.weight.as_ref()).or_else(|| numeric(self.load.as_ref()))
    }

    /// Replaces the value `load` was read from.
    pub fn set_load(&mut self, load: f64) {
        if numeric(self.weight.as_ref()).is_none() && numeric(self.load.as_ref()).is_some() {
            self.load = Some(load.into());
        } else {
            self.weight = Some(load.into());
        }
    }

    /// Reps if given as a plain number; ranges and other notations yield `None`.
    #[must_use]
    pub fn reps(&self) -> Option<u32> {
        numeric(self.reps.as_ref()).and_then(to_count)
    }

    pub fn set_reps(&mut self, reps: u32) {
        self.reps = Some(reps.into());
    }

    #[must_use]
    pub fn prior_week_rpe(&self) -> Option<f64> {
        self.prior_week_rpe.as_ref().and_then(to_number)
    }

    pub fn append_note(&mut self, note: &str) {
        let notes = match self.notes.as_ref().map(value_text) {
            Some(notes) if !notes.is_empty() => format!("{notes} {note}"),
            _ => note.to_string(),
        };
        self.notes = Some(notes.into());
    }
}

/// Any name value as text; `null` and other falsy values give an empty name.
fn name_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = Option::<Value>::deserialize(deserializer)?;
    Ok(name
        .filter(is_truthy)
        .map(|name| value_text(&name))
        .unwrap_or_default())
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}
