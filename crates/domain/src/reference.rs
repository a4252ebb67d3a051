use std::{collections::HashSet, sync::LazyLock};

use log::debug;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::slug::{slugify, strip_name_decorations};

/// Markdown link to an exercise page, e.g. `[Goblet Squat](../exercises/goblet_squat.json)`.
pub(crate) static EXERCISE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[(.*?)\]\(((?:https?://[^)]+/exercAIse/)?(?:\.\./)?(?:\./)?exercises/[A-Za-z0-9_-]+\.(?:md|json))\)",
    )
    .expect("valid exercise link regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseReference {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// All exercise links of a Markdown document in document order, duplicates included.
#[must_use]
pub fn extract_exercises_from_markdown(md: &str) -> Vec<ExerciseReference> {
    EXERCISE_LINK
        .captures_iter(md)
        .map(|caps| ExerciseReference {
            title: caps[1].to_string(),
            url: Some(caps[2].to_string()),
        })
        .collect()
}

/// Exercise names found in any `name` or `exercise` field of a JSON document.
///
/// Names are deduplicated by slug, the first occurrence wins.
#[must_use]
pub fn extract_exercises_from_json(json_text: &str) -> Vec<ExerciseReference> {
    let data = match serde_json::from_str::<Value>(json_text) {
        Ok(data) => data,
        Err(err) => {
            debug!("failed to parse exercise references: {err}");
            return vec![];
        }
    };

    let mut references = ReferenceCollector::default();
    references.walk(&data);
    references.exercises
}

#[derive(Default)]
struct ReferenceCollector {
    seen: HashSet<String>,
    exercises: Vec<ExerciseReference>,
}

impl ReferenceCollector {
    fn walk(&mut self, node: &Value) {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            Value::Object(map) => {
                for field in ["name", "exercise"] {
                    if let Some(Value::String(name)) = map.get(field) {
                        self.add(name);
                    }
                }
                for value in map.values() {
                    self.walk(value);
                }
            }
            _ => {}
        }
    }

    fn add(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        let title = strip_name_decorations(name);
        if self.seen.insert(slugify(&title)) {
            self.exercises.push(ExerciseReference { title, url: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn titles(references: &[ExerciseReference]) -> Vec<&str> {
        references.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_extract_exercises_from_markdown() {
        let md = "
# Workout
- [Goblet Squat](../exercises/goblet_squat.json) - 3x12
- [Push-ups](../exercises/push_ups.md) - 3x15
- [Not an exercise](../notes/readme.md)
- [Goblet Squat](./exercises/goblet_squat.json) - finisher
";
        assert_eq!(
            extract_exercises_from_markdown(md),
            vec![
                ExerciseReference {
                    title: "Goblet Squat".into(),
                    url: Some("../exercises/goblet_squat.json".into()),
                },
                ExerciseReference {
                    title: "Push-ups".into(),
                    url: Some("../exercises/push_ups.md".into()),
                },
                ExerciseReference {
                    title: "Goblet Squat".into(),
                    url: Some("./exercises/goblet_squat.json".into()),
                },
            ]
        );
    }

    #[test]
    fn test_extract_exercises_from_markdown_absolute_url() {
        let md = "[Squat](https://github.com/user/exercAIse/exercises/squat.json)";
        let references = extract_exercises_from_markdown(md);
        assert_eq!(titles(&references), vec!["Squat"]);
        assert_eq!(
            references[0].url.as_deref(),
            Some("https://github.com/user/exercAIse/exercises/squat.json")
        );
    }

    #[test]
    fn test_extract_exercises_from_markdown_without_links() {
        assert!(extract_exercises_from_markdown("Just some regular text").is_empty());
    }

    #[test]
    fn test_extract_exercises_from_json() {
        let json = json!({
            "metadata": {"title": "Test"},
            "warmup": [{"name": "[Squat](../exercises/squat.json)"}],
            "main": [
                {"name": "1) Push-up"},
                {"exercise": "Pull-up"},
                {"name": "push up"},
                {"name": "Circuit", "items": [{"exercise": "2. Plank"}]}
            ],
            "cooldown": []
        });
        assert_eq!(
            titles(&extract_exercises_from_json(&json.to_string())),
            vec!["Squat", "Push-up", "Pull-up", "Circuit", "Plank"]
        );
    }

    #[test]
    fn test_extract_exercises_from_json_ignores_non_string_names() {
        let json = json!([{"name": 5}, {"name": ""}, {"exercise": {"name": "Dip"}}]);
        assert_eq!(titles(&extract_exercises_from_json(&json.to_string())), vec!["Dip"]);
    }

    #[test]
    fn test_extract_exercises_from_malformed_json() {
        assert!(extract_exercises_from_json("{ invalid json }").is_empty());
    }
}
