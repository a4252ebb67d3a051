use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};

use crate::{
    ExerciseKey, Multiplier, PrescriptionRow, PrescriptionsByExercise, RowTemplate,
    json::parse_json_prescriptions,
    prescription::{BODYWEIGHT, PER_SIDE},
    reference::EXERCISE_LINK,
};

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json[^\n]*\n(.*?)\n```").expect("valid fenced json regex")
});
static SETS_X_REPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{1,2})\s*[x×]\s*([0-9]{1,3})").expect("valid sets x reps regex")
});
static SETS_OF_REPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{1,2})\s*sets?\s*(?:of|x)?\s*([0-9]{1,3})")
        .expect("valid sets of reps regex")
});
static REPS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{1,3})\s*reps?").expect("valid reps regex"));
static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]{1,3}(?:\.[0-9]+)?)\s*(lb|lbs|kg)").expect("valid weight regex")
});
static RPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RPE\s*([0-9]{1,2}(?:\.[0-9]+)?)").expect("valid rpe regex")
});
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid heading regex"));
static ENDURANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(run|jog|walk|tempo|quality run|easy run|bike|cycle|ride|rower|rowing|erg|swim)\b")
        .expect("valid endurance regex")
});
static DISTANCE_MILES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*(?:mi|miles?|mile)\b").expect("valid distance regex")
});
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?\b").expect("valid clock time regex")
});
static MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9]{1,3})\s*(?:min|minutes)\b").expect("valid minutes regex")
});

const DEFAULT_ENDURANCE_NAME: &str = "Run";

/// Sets and reps recognised in the text around an exercise link.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Volume {
    sets: Option<u32>,
    reps: Option<u32>,
}

type VolumeMatcher = fn(&str) -> Option<Volume>;

/// Tried in order, the first match wins.
const VOLUME_MATCHERS: [(&str, VolumeMatcher); 3] = [
    ("sets x reps", sets_x_reps),
    ("sets of reps", sets_of_reps),
    ("reps only", reps_only),
];

fn capture_u32(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn sets_x_reps(context: &str) -> Option<Volume> {
    let caps = SETS_X_REPS.captures(context)?;
    Some(Volume {
        sets: capture_u32(&caps, 1),
        reps: capture_u32(&caps, 2),
    })
}

fn sets_of_reps(context: &str) -> Option<Volume> {
    let caps = SETS_OF_REPS.captures(context)?;
    Some(Volume {
        sets: capture_u32(&caps, 1),
        reps: capture_u32(&caps, 2),
    })
}

fn reps_only(context: &str) -> Option<Volume> {
    let caps = REPS_ONLY.captures(context)?;
    Some(Volume {
        sets: None,
        reps: capture_u32(&caps, 1),
    })
}

fn match_volume(context: &str) -> Option<Volume> {
    VOLUME_MATCHERS.iter().find_map(|(name, matcher)| {
        let volume = matcher(context)?;
        debug!("matched {name} in {context:?}");
        Some(volume)
    })
}

/// Per-set rows for every linked exercise of a Markdown workout.
///
/// A fenced `json` block is preferred when it yields any prescription. Otherwise the text around
/// each exercise link is searched for sets, reps, load and RPE. Endurance sessions without any
/// linked exercise get a single aggregate row.
#[must_use]
pub fn parse_markdown_prescriptions(md: &str) -> PrescriptionsByExercise {
    if let Some(block) = FENCED_JSON.captures_iter(md).last() {
        let prescriptions = parse_json_prescriptions(&block[1]);
        if !prescriptions.is_empty() {
            debug!("using prescriptions of fenced JSON block");
            return prescriptions;
        }
    }

    let mut prescriptions = PrescriptionsByExercise::new();
    let lines = md.lines().collect::<Vec<_>>();

    for (i, line) in lines.iter().enumerate() {
        let Some(link) = EXERCISE_LINK.captures(line) else {
            continue;
        };
        let context = format!(
            "{line} {} {}",
            lines.get(i + 1).unwrap_or(&""),
            lines.get(i + 2).unwrap_or(&"")
        );
        let rows = rows_from_context(&context);
        if !rows.is_empty() {
            prescriptions.insert(ExerciseKey::new(&link[1]), rows);
        }
    }

    if prescriptions.is_empty() && ENDURANCE.is_match(&md.to_lowercase()) {
        let title = HEADING
            .captures(md)
            .map(|caps| caps[1].trim().to_string())
            .filter(|title| !title.is_empty());
        let key = ExerciseKey::new(title.as_deref().unwrap_or(DEFAULT_ENDURANCE_NAME));
        if let Some(row) = endurance_row(md) {
            debug!("using endurance summary for {key}");
            prescriptions.entry(key).or_insert_with(|| vec![row]);
        }
    }

    prescriptions
}

fn rows_from_context(context: &str) -> Vec<PrescriptionRow> {
    let volume = match_volume(context);
    let sets = volume.and_then(|v| v.sets).unwrap_or(0);

    let mut multiplier = None;
    if PER_SIDE.is_match(context) {
        multiplier = Some(Multiplier::PerSide);
    }
    if BODYWEIGHT.is_match(context) {
        multiplier = Some(Multiplier::Bodyweight);
    }

    let template = RowTemplate {
        reps: volume.and_then(|v| v.reps),
        weight: WEIGHT
            .captures(context)
            .and_then(|caps| caps[1].parse().ok()),
        multiplier,
        rpe: RPE.captures(context).and_then(|caps| caps[1].parse().ok()),
        ..RowTemplate::default()
    };

    let count = if sets > 0 {
        sets as usize
    } else {
        usize::from(template.reps.is_some())
    };

    template.rows(count)
}

/// Distance, RPE and duration of a whole endurance document, if any of them is mentioned.
fn endurance_row(md: &str) -> Option<PrescriptionRow> {
    let distance_miles = DISTANCE_MILES
        .captures(md)
        .and_then(|caps| caps[1].parse().ok());
    let rpe = RPE.captures(md).and_then(|caps| caps[1].parse().ok());
    let time_seconds = match CLOCK_TIME.captures(md) {
        Some(caps) => clock_seconds(&caps),
        None => MINUTES
            .captures(md)
            .and_then(|caps| capture_u32(&caps, 1))
            .map(|minutes| minutes * 60),
    };

    if distance_miles.is_none() && rpe.is_none() && time_seconds.is_none() {
        return None;
    }

    Some(PrescriptionRow {
        set: 1,
        rpe,
        time_seconds,
        distance_miles,
        ..PrescriptionRow::default()
    })
}

/// `mm:ss`, or `h:mm:ss` when the third group is present.
fn clock_seconds(caps: &Captures) -> Option<u32> {
    let first = capture_u32(caps, 1)?;
    let second = capture_u32(caps, 2)?;
    Some(match capture_u32(caps, 3) {
        Some(third) => first * 3600 + second * 60 + third,
        None => first * 60 + second,
    })
}
