use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Action;

/// An untyped action: a `type` tag plus arbitrary JSON fields.
///
/// Useful when actions cross a serialization boundary or when a test only
/// cares about kinds and a few payload fields. Serializes flat, with the
/// kind under the `type` key:
///
/// ```rust
/// use serde_json::json;
/// use waitfor::{Action, RawAction};
///
/// let action: RawAction = serde_json::from_value(json!({
///     "type": "user/loggedIn",
///     "id": 7,
/// }))
/// .unwrap();
///
/// assert_eq!(action.kind(), "user/loggedIn");
/// assert_eq!(action.get("id"), Some(&json!(7)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl RawAction {
    /// Create an action with an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

impl Action for RawAction {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.kind)
    }
}
