//! Persisted dialog stack.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One running dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub dialog_id: String,

    /// Index of the step that receives the next input.
    pub step_index: usize,

    /// Owned by the dialog; the machine never looks inside.
    #[serde(default)]
    pub state: Value,
}

impl DialogFrame {
    pub fn new(dialog_id: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            step_index: 0,
            state: Value::Null,
        }
    }
}

/// Array-backed stack of frames; the last frame is the active one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogStack {
    #[serde(default)]
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Dialog ids from bottom to top.
    pub fn dialog_ids(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.dialog_id.as_str()).collect()
    }
}
