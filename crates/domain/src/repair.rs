use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::number::is_truthy;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?").expect("valid opening fence regex"));
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("valid fence regex"));
static BARE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):\s*([0-9]+)\s*-\s*([0-9]+)(lbs|lb)?(\s*[},])").expect("valid range regex")
});
static BARE_WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):\s*([0-9]+)(?:lbs|lb)(\s*[},])").expect("valid weight regex")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"));

/// Removes one opening ```` ``` ```` or ```` ```json ```` marker and one closing marker.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let text = OPENING_FENCE.find(text).map_or(text, |m| &text[m.end()..]);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Rewrites common mistakes of hand-written or generated JSON.
///
/// Bare ranges become strings (`: 8-12,` → `: "8-12",`), a pound unit after a bare number is
/// dropped (`: 75lbs}` → `: 75}`) and trailing commas are removed.
#[must_use]
pub fn sanitize_loose_json(text: &str) -> String {
    let text = BARE_RANGE.replace_all(text, |caps: &Captures| {
        let unit = caps
            .get(3)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        format!(": \"{}-{}{unit}\"{}", &caps[1], &caps[2], &caps[4])
    });
    let text = BARE_WEIGHT.replace_all(&text, ": ${1}${2}");
    TRAILING_COMMA.replace_all(&text, "${1}").into_owned()
}

/// First JSON value found in text that may be wrapped in prose or code fences.
///
/// Tried in order: the whole text without fences, each fenced block, the earliest balanced
/// object or array, the span from the first `{` to the last `}`. Values like `null`, `false`,
/// `0` or `""` do not count as found.
#[must_use]
pub fn extract_first_json_value(text: &str) -> Option<Value> {
    if let Some(value) = safe_parse(strip_code_fences(text)) {
        return Some(value);
    }

    if let Some(value) = FENCED_BLOCK
        .captures_iter(text)
        .find_map(|caps| safe_parse(caps[1].trim()))
    {
        debug!("using JSON of fenced block");
        return Some(value);
    }

    let object = first_balanced(text, b'{', b'}');
    let array = first_balanced(text, b'[', b']');
    let balanced = match (object, array) {
        (Some(object), Some(array)) => Some(if array.0 < object.0 { array } else { object }),
        (object, array) => object.or(array),
    };
    if let Some((start, value)) = balanced {
        debug!("using balanced JSON at offset {start}");
        return Some(value);
    }

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last > first {
        let value = safe_parse(&text[first..=last]);
        if value.is_some() {
            debug!("using JSON between outermost braces");
        }
        value
    } else {
        None
    }
}

pub(crate) fn safe_parse(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(is_truthy)
}

/// Start and value of the first balanced `open`…`close` span that parses.
fn first_balanced(text: &str, open: u8, close: u8) -> Option<(usize, Value)> {
    let mut depth = 0_usize;
    let mut start = None;

    for (i, byte) in text.bytes().enumerate() {
        if byte == open {
            if depth == 0 {
                start = Some(i);
            }
            depth += 1;
        } else if byte == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                if let Some(s) = start.take() {
                    if let Some(value) = safe_parse(&text[s..=i]) {
                        return Some((s, value));
                    }
                }
            }
        }
    }

    None
}
