use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::{
    PlanError, PlanExercise,
    ladder::{LadderSettings, apply_dumbbell_ladder_with},
    number::{is_truthy, value_text},
    repair::{extract_first_json_value, safe_parse, sanitize_loose_json},
    reps::normalize_session_plan_reps,
};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid non-alphanumeric regex"));

const MAX_LEGACY_SLUG_LEN: usize = 60;
const DEFAULT_SETS: u32 = 3;
const DEFAULT_REPS: u32 = 8;
const DEFAULT_RPE: u32 = 7;

/// Turns generated session-plan text into a normalized plan object.
///
/// The text is repaired and the first JSON value is taken from it. A legacy `workouts` list is
/// converted to `exercises`, dumbbell loads are snapped onto the ladder, reps are normalized and
/// `notes` is guaranteed to be a string.
pub fn prepare_session_plan(raw: &str) -> Result<Value, PlanError> {
    prepare_session_plan_with(raw, &LadderSettings::default())
}

pub fn prepare_session_plan_with(raw: &str, settings: &LadderSettings) -> Result<Value, PlanError> {
    let sanitized = sanitize_loose_json(raw);
    let mut plan = safe_parse(&sanitized)
        .or_else(|| {
            debug!("plan is not plain JSON, searching for embedded JSON");
            extract_first_json_value(&sanitized)
        })
        .ok_or(PlanError::NoJson)?;

    let Value::Object(object) = &mut plan else {
        return Err(PlanError::NotAnObject);
    };

    convert_legacy_shape(object);
    apply_ladder(object, settings)?;
    normalize_session_plan_reps(&mut plan);

    if let Value::Object(object) = &mut plan {
        let notes = object
            .get("notes")
            .filter(|notes| is_truthy(notes))
            .map(value_text)
            .unwrap_or_default();
        object.insert("notes".into(), notes.into());
    }

    Ok(plan)
}

fn convert_legacy_shape(plan: &mut Map<String, Value>) {
    if is_present(plan, "exercises") {
        return;
    }

    if let Some(Value::Array(workouts)) = plan.get("workouts") {
        warn!("converting legacy workouts list to exercises");
        let exercises = workouts
            .iter()
            .enumerate()
            .map(|(i, workout)| legacy_exercise(i, workout))
            .collect::<Vec<_>>();
        plan.insert("exercises".into(), exercises.into());
    } else if is_present(plan, "sections") {
        plan.insert("exercises".into(), Value::Array(vec![]));
    }
}

fn is_present(plan: &Map<String, Value>, key: &str) -> bool {
    plan.get(key).is_some_and(is_truthy)
}

fn first_truthy(workout: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| workout.get(*key))
        .find(|value| is_truthy(value))
        .cloned()
}

fn legacy_exercise(index: usize, workout: &Value) -> Value {
    let name = first_truthy(workout, &["exercise", "name"])
        .map_or_else(|| format!("Exercise {}", index + 1), |name| value_text(&name));

    let mut prescribed = Map::new();
    prescribed.insert(
        "sets".into(),
        first_truthy(workout, &["sets", "set"]).unwrap_or_else(|| DEFAULT_SETS.into()),
    );
    prescribed.insert(
        "reps".into(),
        first_truthy(workout, &["reps", "rep"]).unwrap_or_else(|| DEFAULT_REPS.into()),
    );
    prescribed.insert(
        "rpe".into(),
        first_truthy(workout, &["rpe"]).unwrap_or_else(|| DEFAULT_RPE.into()),
    );
    if let Some(weight) = workout.get("weight").filter(|weight| weight.is_number()) {
        prescribed.insert("weight".into(), weight.clone());
    }
    if let Some(notes) = first_truthy(workout, &["notes"]) {
        prescribed.insert("notes".into(), notes);
    }

    json!({
        "slug": legacy_slug(&name),
        "name": name,
        "prescribed": prescribed,
    })
}

/// Lowercase name with `_` between alphanumeric runs, at most 60 characters.
fn legacy_slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let slug = NON_ALPHANUMERIC.replace_all(&lower, "_");
    slug.trim_matches('_')
        .chars()
        .take(MAX_LEGACY_SLUG_LEN)
        .collect()
}

/// Fields of a prescription the ladder may change.
const LADDER_FIELDS: [&str; 4] = ["weight", "load", "reps", "notes"];

/// Snaps dumbbell loads of the plan's exercises.
///
/// Entries that do not read as an exercise are left out of the ladder. Only the changed fields
/// of snapped prescriptions are written back, everything else in the plan stays as it is.
fn apply_ladder(plan: &mut Map<String, Value>, settings: &LadderSettings) -> Result<(), PlanError> {
    let Some(Value::Array(entries)) = plan.get_mut("exercises") else {
        return Ok(());
    };

    let (indices, exercises): (Vec<usize>, Vec<PlanExercise>) = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            match serde_json::from_value::<PlanExercise>(entry.clone()) {
                Ok(exercise) => Some((i, exercise)),
                Err(err) => {
                    warn!("leaving exercise {} out of load ladder: {err}", i + 1);
                    None
                }
            }
        })
        .unzip();

    let outcome = apply_dumbbell_ladder_with(exercises.clone(), settings);
    if !outcome.modified {
        return Ok(());
    }
    debug!("load ladder adjusted exercises");

    for ((index, before), after) in indices.into_iter().zip(&exercises).zip(&outcome.exercises) {
        if before != after {
            patch_prescription(&mut entries[index], after)?;
        }
    }

    Ok(())
}

fn patch_prescription(entry: &mut Value, exercise: &PlanExercise) -> Result<(), PlanError> {
    let key = if exercise.prescribed.is_some() {
        "prescribed"
    } else {
        "prescription"
    };
    let Some(prescribed) = exercise.active_prescription() else {
        return Ok(());
    };
    let Value::Object(updated) = serde_json::to_value(prescribed)? else {
        return Ok(());
    };
    let Some(Value::Object(original)) = entry.get_mut(key) else {
        return Ok(());
    };

    for field in LADDER_FIELDS {
        if let Some(value) = updated.get(field) {
            original.insert(field.into(), value.clone());
        }
    }

    Ok(())
}
