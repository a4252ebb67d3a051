use std::{borrow::Borrow, sync::LazyLock};

use derive_more::{Deref, Display};
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
static ORDINAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+[).-]\s*").expect("valid ordinal regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));

/// Lower-case, hyphen-joined, alphanumeric-only form of a display name.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Drops a leading ordinal ("1) ", "2. ", "3-") and unwraps a Markdown link to its text.
pub(crate) fn strip_name_decorations(name: &str) -> String {
    let name = ORDINAL_PREFIX.replace(name, "");
    match LINK.captures(&name) {
        Some(caps) => caps[1].to_string(),
        None => name.into_owned(),
    }
}

/// Display name of an exercise as written in a plan, without numbering or link markup.
#[must_use]
pub fn plain_name(name: &str) -> String {
    strip_name_decorations(name.trim())
}

/// Canonical key of an exercise, derived from its name.
#[derive(
    Deref, Display, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExerciseKey(String);

impl ExerciseKey {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(slugify(text))
    }

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::new(&plain_name(name))
    }
}

impl Borrow<str> for ExerciseKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ExerciseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
