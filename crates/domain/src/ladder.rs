use log::{debug, warn};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::{
    PlanExercise, Prescribed,
    number::{format_number, round_to},
};

const MAX_RUNGS: usize = 1000;
const EPSILON: f64 = 1e-9;

/// Shape of the weight ladder that dumbbell loads are snapped onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderSettings {
    /// Distance between two rungs.
    pub step: f64,
    /// Highest permitted rung.
    pub ceiling: f64,
    /// Case-insensitive pattern selecting the exercises the ladder applies to.
    pub pattern: String,
}

impl Default for LadderSettings {
    fn default() -> Self {
        Self {
            step: 10.0,
            ceiling: 150.0,
            pattern: String::from("dumbbell|db"),
        }
    }
}

/// Ascending weights sharing the fractional offset of an anchor weight.
///
/// An anchor of 27.5 gives 7.5, 17.5, 27.5, … up to the ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadLadder {
    rungs: Vec<f64>,
}

impl LoadLadder {
    #[must_use]
    pub fn anchored_at(base: f64, settings: &LadderSettings) -> Self {
        if !(base.is_finite() && settings.step > 0.0) {
            return Self { rungs: vec![] };
        }
        let offset = base.rem_euclid(settings.step);
        let rungs = (0_u32..)
            .map(|k| round_to(offset + settings.step * f64::from(k), 1))
            .take_while(|rung| *rung <= settings.ceiling)
            .take(MAX_RUNGS)
            .collect();
        Self { rungs }
    }

    #[must_use]
    pub fn rungs(&self) -> &[f64] {
        &self.rungs
    }

    /// First rung not below `weight`, or the top rung if `weight` is above all of them.
    #[must_use]
    pub fn snap(&self, weight: f64) -> Option<f64> {
        self.rungs
            .iter()
            .copied()
            .find(|rung| *rung >= weight)
            .or_else(|| self.rungs.last().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LadderOutcome {
    pub exercises: Vec<PlanExercise>,
    pub modified: bool,
}

#[must_use]
pub fn apply_dumbbell_ladder(exercises: Vec<PlanExercise>) -> LadderOutcome {
    apply_dumbbell_ladder_with(exercises, &LadderSettings::default())
}

/// Snaps the loads of all matching exercises onto the ladder anchored at the first of them.
///
/// The first matching exercise with a numeric load is the anchor and keeps its load. A snapped
/// load that is heavier than prescribed lowers the reps and the exercise gets a
/// `[LADDER snap…]` note. Loads already on the ladder are left alone, so applying the ladder
/// again changes nothing.
#[must_use]
pub fn apply_dumbbell_ladder_with(
    mut exercises: Vec<PlanExercise>,
    settings: &LadderSettings,
) -> LadderOutcome {
    let pattern = match RegexBuilder::new(&settings.pattern)
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!("invalid ladder pattern {:?}: {err}", settings.pattern);
            return LadderOutcome {
                exercises,
                modified: false,
            };
        }
    };

    let loads = exercises
        .iter()
        .map(|exercise| {
            if pattern.is_match(exercise.label()) {
                exercise.active_prescription().and_then(Prescribed::load)
            } else {
                None
            }
        })
        .collect::<Vec<_>>();

    let Some(mut base) = loads.iter().flatten().copied().next() else {
        return LadderOutcome {
            exercises,
            modified: false,
        };
    };
    let mut ladder = LoadLadder::anchored_at(base, settings);
    let mut anchor_confirmed = false;
    let mut modified = false;

    for (exercise, load) in exercises.iter_mut().zip(loads) {
        let Some(weight) = load else {
            continue;
        };

        if !anchor_confirmed {
            // A first load off the anchor becomes the new anchor.
            if (weight - base).abs() > EPSILON {
                base = weight;
                ladder = LoadLadder::anchored_at(base, settings);
            }
            anchor_confirmed = true;
            continue;
        }

        let Some(snapped) = ladder.snap(weight) else {
            continue;
        };
        if (snapped - weight).abs() <= EPSILON {
            continue;
        }
        let Some(prescribed) = exercise.active_prescription_mut() else {
            continue;
        };

        let delta = snapped - weight;
        prescribed.set_load(snapped);

        let mut note = format!(
            "[LADDER snap{}{} -> {}",
            if delta < 0.0 { "-" } else { "+" },
            format_number(round_to(delta.abs(), 2)),
            format_number(snapped)
        );
        if let Some(reps) = prescribed.reps() {
            let adjusted = adjust_reps(reps, delta, prescribed.prior_week_rpe());
            if adjusted != reps {
                prescribed.set_reps(adjusted);
                note.push_str(&format!(", reps {adjusted}"));
            }
        }
        note.push(']');
        prescribed.append_note(&note);

        debug!("snapped {} from {weight} to {snapped}", exercise.label());
        modified = true;
    }

    LadderOutcome {
        exercises,
        modified,
    }
}

/// Reps after moving `delta` up the ladder.
///
/// Up to 5 heavier keeps the reps only if last week's RPE was at most 7. An unknown RPE counts
/// as harder than that.
#[must_use]
pub fn adjust_reps(reps: u32, delta: f64, prior_week_rpe: Option<f64>) -> u32 {
    if delta <= 0.0 {
        reps
    } else if delta <= 5.0 {
        match prior_week_rpe {
            Some(rpe) if rpe <= 7.0 => reps,
            _ => reps.saturating_sub(1).max(1),
        }
    } else {
        reps.saturating_sub(2).max(1)
    }
}
