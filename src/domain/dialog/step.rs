//! Values passed between dialog steps and the transitions a step can request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::activity::Activity;

/// Input or result flowing between steps and dialogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DialogValue {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Activity(Box<Activity>),
}

impl DialogValue {
    pub fn activity(activity: Activity) -> Self {
        DialogValue::Activity(Box::new(activity))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DialogValue::Empty)
    }

    /// Trimmed question text, if this value carries any.
    pub fn question_text(&self) -> Option<&str> {
        let text = match self {
            DialogValue::Text(text) => text.as_str(),
            DialogValue::Activity(activity) => activity.text_or_empty(),
            DialogValue::Empty | DialogValue::Json(_) => return None,
        };
        Some(text.trim()).filter(|t| !t.is_empty())
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            DialogValue::Activity(activity) => Some(activity),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DialogValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// What to send when a dialog suspends for input.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOptions {
    pub prompt: Activity,
}

impl PromptOptions {
    pub fn new(prompt: Activity) -> Self {
        Self { prompt }
    }
}

/// Transition requested by a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Run the next step of this dialog with the value.
    Continue(DialogValue),
    /// Send the prompt and wait for the next turn.
    Prompt(PromptOptions),
    /// Push a child dialog; this dialog resumes at its next step when the child ends.
    Begin {
        dialog_id: String,
        options: DialogValue,
    },
    /// Pop this dialog and hand the value to the parent.
    End(DialogValue),
    /// Pop this dialog and start another in its place.
    Replace {
        dialog_id: String,
        options: DialogValue,
    },
}

impl StepResult {
    pub fn begin(dialog_id: impl Into<String>, options: DialogValue) -> Self {
        StepResult::Begin {
            dialog_id: dialog_id.into(),
            options,
        }
    }

    pub fn replace(dialog_id: impl Into<String>, options: DialogValue) -> Self {
        StepResult::Replace {
            dialog_id: dialog_id.into(),
            options,
        }
    }

    pub fn end() -> Self {
        StepResult::End(DialogValue::Empty)
    }
}
