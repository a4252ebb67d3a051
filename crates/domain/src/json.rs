use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

use crate::{
    ExerciseKey, PrescriptionRow, PrescriptionsByExercise, RowTemplate, WeightSpec,
    number::{first_number, integer_part, is_truthy, to_count, to_number, value_text},
};

static ROUNDS_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*[–-]\s*([0-9]+)\s*rounds?").expect("valid rounds range regex")
});
static ROUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+)\s*rounds?").expect("valid rounds regex"));

const TARGET_FIELDS: [&str; 9] = [
    "sets",
    "reps",
    "timeSeconds",
    "holdSeconds",
    "distanceMiles",
    "distanceMeters",
    "rpe",
    "weight",
    "load",
];

/// Per-set rows for every exercise of a JSON workout document.
///
/// Malformed JSON yields an empty map.
#[must_use]
pub fn parse_json_prescriptions(json_text: &str) -> PrescriptionsByExercise {
    let mut prescriptions = PrescriptionsByExercise::new();

    match serde_json::from_str::<Value>(json_text) {
        Ok(data) => walk(&data, None, &mut prescriptions),
        Err(err) => debug!("failed to parse prescriptions: {err}"),
    }

    prescriptions
}

/// What a JSON object represents, decided by the fields present.
enum Node<'a> {
    /// `{"kind": "exercise", "name": ...}`
    Exercise(&'a Value),
    /// `{"name": ..., "sets": ...}` or a named node whose `prescription` holds targets
    Prescribed(&'a Value),
    /// `{"exercise": "..."}`
    Named(&'a str),
    Container,
}

impl<'a> Node<'a> {
    fn classify(node: &'a Map<String, Value>, config: Option<&Map<String, Value>>) -> Self {
        let name = node.get("name").filter(|name| is_truthy(name));

        if let Some(name) = name {
            if node.get("kind").and_then(Value::as_str) == Some("exercise") {
                return Node::Exercise(name);
            }
            let has_target = config.is_some_and(|config| {
                TARGET_FIELDS
                    .iter()
                    .any(|field| config.get(*field).is_some_and(|v| !v.is_null()))
            });
            return if has_target {
                Node::Prescribed(name)
            } else {
                Node::Container
            };
        }

        match node.get("exercise") {
            Some(Value::String(exercise)) if !exercise.is_empty() => Node::Named(exercise),
            _ => Node::Container,
        }
    }
}

fn walk(node: &Value, rounds_hint: Option<i64>, prescriptions: &mut PrescriptionsByExercise) {
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, rounds_hint, prescriptions);
            }
        }
        Value::Object(map) => {
            let rounds_hint = update_rounds_hint(map, rounds_hint);
            let config = match map.get("prescription") {
                Some(prescription) if is_truthy(prescription) => prescription.as_object(),
                _ => Some(map),
            };

            match Node::classify(map, config) {
                Node::Exercise(name) | Node::Prescribed(name) => {
                    add_exercise(&value_text(name), config, rounds_hint, prescriptions);
                }
                Node::Named(name) => add_exercise(name, config, rounds_hint, prescriptions),
                Node::Container => {}
            }

            for value in map.values() {
                walk(value, rounds_hint, prescriptions);
            }
        }
        _ => {}
    }
}

/// An explicit `rounds` wins over a rounds count in the title; notes only fill in a missing hint.
#[allow(clippy::cast_possible_truncation)]
fn update_rounds_hint(node: &Map<String, Value>, inherited: Option<i64>) -> Option<i64> {
    if let Some(rounds) = node
        .get("rounds")
        .and_then(Value::as_f64)
        .filter(|r| *r != 0.0)
    {
        return Some(rounds.floor() as i64);
    }

    let mut hint = inherited;

    if let Some(title) = node.get("title").filter(|t| is_truthy(t)) {
        if let Some(rounds) = parse_rounds_hint(&value_text(title)) {
            hint = Some(rounds);
        }
    }

    if hint.is_none() {
        if let Some(notes) = node.get("notes").filter(|n| is_truthy(n)) {
            hint = parse_rounds_hint(&value_text(notes));
        }
    }

    hint
}

/// Rounds count mentioned in free text, e.g. "4 rounds" or "3-4 rounds" (the larger count).
fn parse_rounds_hint(text: &str) -> Option<i64> {
    if let Some(caps) = ROUNDS_RANGE.captures(text) {
        if let (Ok(a), Ok(b)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) {
            return Some(a.max(b));
        }
    }
    ROUNDS
        .captures(text)
        .and_then(|caps| caps[1].parse::<i64>().ok())
}

#[allow(clippy::cast_precision_loss)]
fn add_exercise(
    name: &str,
    config: Option<&Map<String, Value>>,
    rounds_hint: Option<i64>,
    prescriptions: &mut PrescriptionsByExercise,
) {
    if name.is_empty() {
        return;
    }

    let key = ExerciseKey::from_name(name);
    let extracted = config.map(read_prescription).unwrap_or_default();

    if !extracted.reps_per_set.is_empty() {
        let rows = extracted
            .reps_per_set
            .iter()
            .zip(1..)
            .map(|(reps, set)| PrescriptionRow {
                set,
                reps: Some(*reps),
                angle: extracted.template.angle,
                ..PrescriptionRow::default()
            })
            .collect();
        prescriptions.insert(key, rows);
        return;
    }

    let mut count = extracted.sets.filter(|s| *s != 0.0).unwrap_or(0.0);
    if let Some(rounds) = rounds_hint.map(|r| r as f64) {
        if rounds > count {
            count = rounds;
        }
    }
    if count == 0.0 && extracted.template.has_target() {
        count = 1.0;
    }

    let rows = extracted
        .template
        .rows(to_count(count).map_or(0, |c| c as usize));
    if !rows.is_empty() {
        prescriptions.insert(key, rows);
    }
}

#[derive(Default)]
struct Extracted {
    sets: Option<f64>,
    reps_per_set: Vec<u32>,
    template: RowTemplate,
}

fn read_prescription(config: &Map<String, Value>) -> Extracted {
    let field = |name: &str| config.get(name).filter(|v| !v.is_null());
    let number = |name: &str| field(name).and_then(to_number);

    let mut extracted = Extracted {
        sets: config.get("sets").and_then(Value::as_f64),
        ..Extracted::default()
    };
    let template = &mut extracted.template;

    template.angle = number("angle").filter(|a| *a != 0.0);

    match config.get("reps") {
        Some(Value::Number(n)) => template.reps = n.as_f64().and_then(to_count),
        Some(Value::String(s)) => template.reps = first_number(s).and_then(to_count),
        Some(Value::Array(items)) => {
            extracted.reps_per_set = items
                .iter()
                .filter_map(integer_part)
                .filter_map(|r| u32::try_from(r).ok())
                .collect();
        }
        _ => {}
    }

    for name in ["weight", "load"] {
        if let Some(value) = field(name) {
            template.apply_weight(WeightSpec::parse(value));
        }
    }

    template.rpe = number("rpe");
    template.time_seconds = number("timeSeconds").and_then(to_count);
    template.hold_seconds = number("holdSeconds").and_then(to_count);
    template.distance_meters = number("distanceMeters");
    template.distance_miles = number("distanceMiles");

    extracted
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{MAX_SETS, Multiplier};

    fn parse(value: &Value) -> PrescriptionsByExercise {
        parse_json_prescriptions(&value.to_string())
    }

    fn row(set: u32) -> PrescriptionRow {
        PrescriptionRow {
            set,
            ..PrescriptionRow::default()
        }
    }

    #[test]
    fn test_exercise_node() {
        let prescriptions = parse(&json!({
            "kind": "exercise",
            "name": "Goblet Squat",
            "prescription": {"sets": 3, "reps": 8}
        }));
        let rows = &prescriptions["goblet-squat"];
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.set).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(rows.iter().all(|r| r.reps == Some(8)));
    }

    #[test]
    fn test_strength_exercise_with_weight_string() {
        let prescriptions = parse(&json!({
            "metadata": {"title": "Test"},
            "warmup": [],
            "main": [{
                "name": "[Goblet Squat](../exercises/goblet_squat.json)",
                "logType": "strength",
                "sets": 3,
                "reps": 12,
                "weight": "50 lb",
                "rpe": 7
            }],
            "cooldown": []
        }));
        assert_eq!(
            prescriptions["goblet-squat"],
            (1..=3)
                .map(|set| PrescriptionRow {
                    reps: Some(12),
                    weight: Some(50.0),
                    rpe: Some(7.0),
                    ..row(set)
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_rounds_hint_from_circuit() {
        let prescriptions = parse(&json!({
            "kind": "circuit",
            "rounds": 4,
            "children": [
                {"kind": "exercise", "name": "Kettlebell Swing", "prescription": {"reps": 15}},
                {"kind": "exercise", "name": "Push-up", "prescription": {"sets": 5, "reps": 10}},
                {"kind": "exercise", "name": "Plank", "prescription": {"sets": 2, "holdSeconds": 30}}
            ]
        }));
        assert_eq!(prescriptions["kettlebell-swing"].len(), 4);
        assert_eq!(prescriptions["push-up"].len(), 5);
        assert_eq!(prescriptions["plank"].len(), 4);
        assert_eq!(prescriptions["plank"][3].hold_seconds, Some(30));
    }

    #[test]
    fn test_rounds_hint_from_title_and_notes() {
        let prescriptions = parse(&json!({
            "sections": [
                {
                    "title": "Finisher: 3-4 rounds",
                    "items": [{"name": "Burpee", "reps": 10}]
                },
                {
                    "title": "Superset",
                    "notes": "2 rounds, minimal rest",
                    "items": [{"name": "Curl", "reps": "12"}]
                },
                {
                    "title": "Accessories",
                    "items": [{"name": "Face Pull", "reps": 15}]
                }
            ]
        }));
        assert_eq!(prescriptions["burpee"].len(), 4);
        assert_eq!(prescriptions["curl"].len(), 2);
        assert_eq!(prescriptions["face-pull"].len(), 1);
    }

    #[test]
    fn test_explicit_rounds_win_over_title() {
        let prescriptions = parse(&json!({
            "title": "5 rounds",
            "rounds": 2,
            "items": [{"name": "Row", "reps": 10}]
        }));
        assert_eq!(prescriptions["row"].len(), 2);
    }

    #[test]
    fn test_notes_do_not_override_inherited_hint() {
        let prescriptions = parse(&json!({
            "rounds": 3,
            "items": [{
                "notes": "6 rounds if fresh",
                "items": [{"name": "Dip", "reps": 8}]
            }]
        }));
        assert_eq!(prescriptions["dip"].len(), 3);
    }

    #[test]
    fn test_reps_array() {
        let prescriptions = parse(&json!({
            "rounds": 5,
            "items": [{
                "kind": "exercise",
                "name": "Incline Bench Press",
                "prescription": {"sets": 3, "reps": [10, "8", "x", 6], "weight": 50, "angle": 30}
            }]
        }));
        assert_eq!(
            prescriptions["incline-bench-press"],
            vec![
                PrescriptionRow {
                    reps: Some(10),
                    angle: Some(30.0),
                    ..row(1)
                },
                PrescriptionRow {
                    reps: Some(8),
                    angle: Some(30.0),
                    ..row(2)
                },
                PrescriptionRow {
                    reps: Some(6),
                    angle: Some(30.0),
                    ..row(3)
                },
            ]
        );
    }

    #[test]
    fn test_reps_array_without_numbers_falls_back() {
        let prescriptions = parse(&json!({"name": "Pull-up", "sets": 2, "reps": ["max", "max"]}));
        assert_eq!(prescriptions["pull-up"], vec![row(1), row(2)]);
    }

    #[test]
    fn test_reps_range_string_uses_first_number() {
        let prescriptions =
            parse(&json!({"name": "Squat", "sets": 3, "reps": "8-12", "weight": "50 lb"}));
        assert_eq!(prescriptions["squat"][0].reps, Some(8));
        assert_eq!(prescriptions["squat"][0].weight, Some(50.0));
    }

    #[test]
    fn test_weight_multipliers() {
        let prescriptions = parse(&json!({
            "main": [
                {"name": "Farmer Carry", "sets": 3, "weight": "60 lb per hand"},
                {"name": "Press", "sets": 3, "reps": 10, "weight": "30 x2"},
                {"name": "Push-up", "sets": 3, "reps": 15, "weight": "bodyweight"},
                {"name": "Trap Bar Deadlift", "sets": 1, "reps": 5, "weight": "135 total"}
            ]
        }));
        assert_eq!(prescriptions["farmer-carry"].len(), 3);
        assert_eq!(prescriptions["farmer-carry"][0].weight, Some(60.0));
        assert_eq!(prescriptions["farmer-carry"][0].multiplier, Some(Multiplier::PerSide));
        assert_eq!(prescriptions["press"][0].multiplier, Some(Multiplier::PerSide));
        assert_eq!(prescriptions["push-up"][0].multiplier, Some(Multiplier::Bodyweight));
        assert_eq!(prescriptions["push-up"][0].weight, None);
        assert_eq!(prescriptions["trap-bar-deadlift"][0].multiplier, Some(Multiplier::Total));
    }

    #[test]
    fn test_load_applied_after_weight() {
        let prescriptions = parse(&json!({
            "name": "Row",
            "prescription": {"sets": 1, "weight": "20 per hand", "load": 45}
        }));
        assert_eq!(prescriptions["row"][0].weight, Some(45.0));
        assert_eq!(prescriptions["row"][0].multiplier, Some(Multiplier::PerSide));
    }

    #[test]
    fn test_single_row_for_targets_without_sets() {
        let prescriptions = parse(&json!({
            "warmup": [{"name": "Arm Circles", "logType": "rpe", "rpe": 3}],
            "main": [{"name": "Easy Run", "distanceMiles": 3.1, "timeSeconds": "1800"}]
        }));
        assert_eq!(
            prescriptions["arm-circles"],
            vec![PrescriptionRow {
                rpe: Some(3.0),
                ..row(1)
            }]
        );
        assert_eq!(
            prescriptions["easy-run"],
            vec![PrescriptionRow {
                time_seconds: Some(1800),
                distance_miles: Some(3.1),
                ..row(1)
            }]
        );
    }

    #[test]
    fn test_kind_exercise_without_targets_has_no_rows() {
        let prescriptions = parse(&json!({"kind": "exercise", "name": "Mobility Flow"}));
        assert!(prescriptions.is_empty());
    }

    #[test]
    fn test_kind_exercise_without_targets_inside_rounds() {
        let prescriptions = parse(&json!({
            "rounds": 2,
            "children": [{"kind": "exercise", "name": "Bear Crawl"}]
        }));
        assert_eq!(prescriptions["bear-crawl"], vec![row(1), row(2)]);
    }

    #[test]
    fn test_exercise_field_names_node() {
        let prescriptions = parse(&json!([{"exercise": "1) Wall Sit", "holdSeconds": 45}]));
        assert_eq!(
            prescriptions["wall-sit"],
            vec![PrescriptionRow {
                hold_seconds: Some(45),
                ..row(1)
            }]
        );
    }

    #[test]
    fn test_named_node_without_targets_is_a_container() {
        let prescriptions = parse(&json!({
            "name": "Upper Body Day",
            "blocks": [{"name": "Lat Pulldown", "sets": 3, "reps": 12}]
        }));
        assert_eq!(
            prescriptions.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["lat-pulldown"]
        );
    }

    #[test]
    fn test_order_and_last_writer_wins() {
        let prescriptions = parse(&json!({
            "main": [
                {"name": "Squat", "sets": 2, "reps": 5},
                {"name": "Bench", "sets": 3, "reps": 5},
                {"name": "squat", "sets": 1, "reps": 3}
            ]
        }));
        assert_eq!(
            prescriptions.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["squat", "bench"]
        );
        assert_eq!(
            prescriptions["squat"],
            vec![PrescriptionRow {
                reps: Some(3),
                ..row(1)
            }]
        );
    }

    #[test]
    fn test_zero_angle_is_dropped() {
        let prescriptions = parse(&json!({"name": "Bench", "sets": 1, "reps": 5, "angle": 0}));
        assert_eq!(prescriptions["bench"][0].angle, None);
    }

    #[test]
    fn test_malformed_json() {
        assert!(parse_json_prescriptions("{ invalid json }").is_empty());
        assert!(parse_json_prescriptions("").is_empty());
    }

    #[test]
    fn test_huge_sets_are_capped() {
        let prescriptions = parse(&json!({"name": "Jumping Jack", "sets": 1e9, "reps": 1}));
        assert_eq!(prescriptions["jumping-jack"].len(), MAX_SETS);
    }
}
