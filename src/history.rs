//! Undo history for scheduler transitions.
//!
//! Each advance records the pre-transition session snapshot plus the inverse
//! of any learnt mutation it performed, so a retreat can replay the exact
//! opposite transition instead of reconstructing state by inference.

use serde::{Deserialize, Serialize};

use crate::scheduler::SessionSnapshot;

/// One reversible scheduler transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Session fields as they were before the advance.
    pub snapshot: SessionSnapshot,
    /// Word whose learnt flag the advance flipped to true, if any.
    pub learnt_flip: Option<String>,
}

/// Ordered stack of past transitions, most recent last.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
