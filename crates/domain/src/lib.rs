#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod duration;
pub mod error;
pub mod exercise;
pub mod json;
pub mod ladder;
pub mod markdown;
pub mod number;
pub mod plan;
pub mod prescription;
pub mod reference;
pub mod repair;
pub mod reps;
pub mod slug;

pub use duration::{duration_from_value, parse_duration_to_seconds, seconds_to_hhmmss};
pub use error::{MultiplierError, PlanError, RepsError};
pub use exercise::{PlanExercise, Prescribed};
pub use json::parse_json_prescriptions;
pub use ladder::{
    LadderOutcome, LadderSettings, LoadLadder, adjust_reps, apply_dumbbell_ladder,
    apply_dumbbell_ladder_with,
};
pub use markdown::parse_markdown_prescriptions;
pub use plan::{prepare_session_plan, prepare_session_plan_with};
pub(crate) use prescription::RowTemplate;
pub use prescription::{
    MAX_SETS, Multiplier, PrescriptionRow, PrescriptionsByExercise, WeightSpec,
};
pub use reference::{
    ExerciseReference, extract_exercises_from_json, extract_exercises_from_markdown,
};
pub use repair::{extract_first_json_value, sanitize_loose_json, strip_code_fences};
pub use reps::{
    NormalizedReps, normalize_prescription_reps, normalize_reps, normalize_session_plan_reps,
    normalized_prescription_reps, normalized_session_plan_reps,
};
pub use slug::{ExerciseKey, plain_name, slugify};
