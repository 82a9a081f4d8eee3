//! Serialized document state validation.
//!
//! The engine treats document content as an opaque string. The only
//! structural knowledge it has is that a valid state is a JSON object with a
//! `root` node holding a non-empty `children` array. Anything else (missing,
//! placeholder, unparseable, or a root without children) is replaced by the
//! canonical empty state.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

static EMPTY_STATE: Lazy<String> = Lazy::new(|| {
    let paragraph = json!({
        "children": [],
        "direction": null,
        "format": "",
        "indent": 0,
        "type": "paragraph",
        "version": 1
    });
    json!({
        "root": {
            "children": [paragraph],
            "direction": null,
            "format": "",
            "indent": 0,
            "type": "root",
            "version": 1
        }
    })
    .to_string()
});

/// Canonical minimal document: a root holding a single empty paragraph.
pub fn empty_state() -> &'static str {
    &EMPTY_STATE
}

/// What a raw stored value turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Parses and has a root with at least one child.
    Valid,
    /// Absent, blank, `{}` or `null`.
    Missing,
    /// Not JSON.
    Unparseable,
    /// JSON, but no root or a root without children.
    Empty,
}

/// Placeholder values the editor emits before it has real state.
pub fn is_placeholder(raw: &str) -> bool {
    matches!(raw.trim(), "" | "{}" | "null")
}

pub fn classify(raw: Option<&str>) -> ContentKind {
    match raw {
        None => ContentKind::Missing,
        Some(raw) if is_placeholder(raw) => ContentKind::Missing,
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Err(_) => ContentKind::Unparseable,
            Ok(value) if has_children(&value) => ContentKind::Valid,
            Ok(_) => ContentKind::Empty,
        },
    }
}

/// Return a state that is safe to hand to the editor.
///
/// Valid content is re-serialized in normalized form; every other kind
/// becomes [`empty_state`]. Sanitizing the result again yields the same
/// string.
pub fn sanitize(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !is_placeholder(r)) else {
        return empty_state().to_string();
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(value) if has_children(&value) => value.to_string(),
        _ => empty_state().to_string(),
    }
}

fn has_children(value: &Value) -> bool {
    value
        .get("root")
        .and_then(|root| root.get("children"))
        .and_then(Value::as_array)
        .is_some_and(|children| !children.is_empty())
}
