//! Dialogue group - a caller-named ordered collection of dialogue elements
//!
//! Groups are plain value snapshots. Editing one in memory changes nothing in
//! the store until it is passed to [`GroupStore::update`](crate::GroupStore::update).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueGroup {
    /// Caller-assigned identifier. The store does not enforce uniqueness.
    pub id: String,
    /// Ordered dialogue elements
    pub elements: Vec<String>,
}

impl DialogueGroup {
    /// Create an empty group
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_elements<I, S>(id: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// Copy of this group with `text` appended
    pub fn with_element(&self, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.elements.push(text.into());
        next
    }

    /// Copy of this group with the element at `index` removed, or `None` if out of range
    pub fn without_element(&self, index: usize) -> Option<Self> {
        if index >= self.elements.len() {
            return None;
        }
        let mut next = self.clone();
        next.elements.remove(index);
        Some(next)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
