use serde::{Deserialize, Serialize};
use std::fmt;

const DIALOGUE_PREFIX: &str = "dlg_";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Identifier of one dialogue. Never reused within a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueId(String);

impl DialogueId {
    pub fn new() -> Self {
        Self(format!("{DIALOGUE_PREFIX}{}", new_id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DialogueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DialogueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DialogueId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DialogueId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
