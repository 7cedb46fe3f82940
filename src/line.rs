//! Dialogue line - a single unit of narrative text

use serde::{Deserialize, Serialize};

/// A line of dialogue. The ID is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub id: i64,
    pub text: String,
}

impl DialogueLine {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for DialogueLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.text)
    }
}
