use serde::{Serialize, Serializer};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepsError {
    #[error("Malformed reps string")]
    MalformedString,
    #[error("Unsupported reps type")]
    UnsupportedType,
}

impl Serialize for RepsError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MultiplierError {
    #[error("Multiplier must be 0, 1 or 2 ({0})")]
    Unknown(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error("no JSON value found in plan text")]
    NoJson,
    #[error("plan must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_reps_error_serializes_as_message() {
        assert_eq!(
            serde_json::to_value(RepsError::MalformedString).unwrap(),
            serde_json::json!("Malformed reps string")
        );
        assert_eq!(
            serde_json::to_value(RepsError::UnsupportedType).unwrap(),
            serde_json::json!("Unsupported reps type")
        );
    }

    #[test]
    fn test_plan_error_from_json_error() {
        let error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(PlanError::from(error), PlanError::Json(_)));
    }
}
