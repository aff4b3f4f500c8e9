//! Dialog machine - interprets step results over an explicit dialog stack.
//!
//! Each turn drives the stack until the active dialog prompts (suspending
//! the conversation until the next inbound activity) or the stack empties.
//! Dialogs never call each other directly; they return a [`StepResult`]
//! and the machine performs the transition.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::activity::Activity;
use crate::domain::dialog::{DialogFrame, DialogStack, DialogValue, StepResult};
use crate::domain::escalation::EscalationForm;
use crate::domain::transcript::FeedbackState;

/// Upper bound on transitions in one turn.
pub const DEFAULT_TRANSITION_LIMIT: usize = 64;

#[derive(Debug, Clone, Error)]
pub enum DialogError {
    #[error("Unknown dialog: {0}")]
    UnknownDialog(String),

    #[error("Dialog {dialog_id} has no step {step}")]
    InvalidStep { dialog_id: String, step: usize },

    #[error("Dialog stack is empty")]
    EmptyStack,

    #[error("Exceeded {0} dialog transitions in one turn")]
    TransitionLimit(usize),

    #[error("Dialog {dialog_id} has unreadable state: {reason}")]
    InvalidState { dialog_id: String, reason: String },
}

/// Mutable per-turn view handed to every step.
#[derive(Debug)]
pub struct DialogContext {
    inbound: Activity,
    pub feedback: FeedbackState,
    outbound: Vec<Activity>,
    escalation: Option<EscalationForm>,
}

impl DialogContext {
    pub fn new(inbound: Activity, feedback: FeedbackState) -> Self {
        Self {
            inbound,
            feedback,
            outbound: Vec::new(),
            escalation: None,
        }
    }

    /// The activity that started this turn.
    pub fn inbound(&self) -> &Activity {
        &self.inbound
    }

    /// Queues an outbound activity.
    pub fn send(&mut self, activity: Activity) {
        self.outbound.push(activity);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(Activity::message(text));
    }

    pub fn outbound(&self) -> &[Activity] {
        &self.outbound
    }

    /// Asks the pipeline to dispatch a form escalation after persisting.
    pub fn request_escalation(&mut self, form: EscalationForm) {
        self.escalation = Some(form);
    }

    pub fn into_parts(self) -> (FeedbackState, Vec<Activity>, Option<EscalationForm>) {
        (self.feedback, self.outbound, self.escalation)
    }
}

/// A waterfall dialog: a fixed sequence of steps.
#[async_trait]
pub trait Dialog: Send + Sync {
    fn id(&self) -> &str;

    fn step_count(&self) -> usize;

    /// Runs one step. `state` is the frame's private state and persists
    /// across turns.
    async fn run_step(
        &self,
        step: usize,
        state: &mut Value,
        input: DialogValue,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError>;
}

/// Dialogs by id.
#[derive(Clone, Default)]
pub struct DialogSet {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
}

impl DialogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dialog: Arc<dyn Dialog>) -> Self {
        self.dialogs.insert(dialog.id().to_string(), dialog);
        self
    }

    pub fn get(&self, dialog_id: &str) -> Result<&Arc<dyn Dialog>, DialogError> {
        self.dialogs
            .get(dialog_id)
            .ok_or_else(|| DialogError::UnknownDialog(dialog_id.to_string()))
    }

    pub fn contains(&self, dialog_id: &str) -> bool {
        self.dialogs.contains_key(dialog_id)
    }
}

/// How a turn left the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStatus {
    /// A dialog prompted and waits for the next activity.
    Waiting,
    /// The root dialog ended with this value; the stack is empty.
    Complete(DialogValue),
}

enum Pending {
    Push {
        dialog_id: String,
        options: DialogValue,
    },
    Run(DialogValue),
    EndTop(DialogValue),
}

pub struct DialogMachine {
    dialogs: DialogSet,
    root: String,
    transition_limit: usize,
}

impl DialogMachine {
    pub fn new(dialogs: DialogSet, root: impl Into<String>) -> Self {
        Self {
            dialogs,
            root: root.into(),
            transition_limit: DEFAULT_TRANSITION_LIMIT,
        }
    }

    pub fn with_transition_limit(mut self, limit: usize) -> Self {
        self.transition_limit = limit;
        self
    }

    /// Resumes the active dialog with the inbound activity, or starts the
    /// root dialog when nothing is running.
    pub async fn continue_or_begin(
        &self,
        stack: &mut DialogStack,
        ctx: &mut DialogContext,
    ) -> Result<TurnStatus, DialogError> {
        let input = DialogValue::activity(ctx.inbound().clone());
        let pending = if stack.is_empty() {
            Pending::Push {
                dialog_id: self.root.clone(),
                options: input,
            }
        } else {
            Pending::Run(input)
        };
        self.drive(stack, ctx, pending).await
    }

    /// Pushes `dialog_id` on top of the stack and runs it.
    pub async fn begin(
        &self,
        stack: &mut DialogStack,
        ctx: &mut DialogContext,
        dialog_id: &str,
        options: DialogValue,
    ) -> Result<TurnStatus, DialogError> {
        let pending = Pending::Push {
            dialog_id: dialog_id.to_string(),
            options,
        };
        self.drive(stack, ctx, pending).await
    }

    async fn drive(
        &self,
        stack: &mut DialogStack,
        ctx: &mut DialogContext,
        mut pending: Pending,
    ) -> Result<TurnStatus, DialogError> {
        for _ in 0..self.transition_limit {
            pending = match pending {
                Pending::Push { dialog_id, options } => {
                    if !self.dialogs.contains(&dialog_id) {
                        return Err(DialogError::UnknownDialog(dialog_id));
                    }
                    tracing::debug!(dialog = %dialog_id, depth = stack.len() + 1, "Begin dialog");
                    stack.push(DialogFrame::new(dialog_id));
                    Pending::Run(options)
                }

                Pending::Run(input) => {
                    let frame = stack.top_mut().ok_or(DialogError::EmptyStack)?;
                    let dialog = Arc::clone(self.dialogs.get(&frame.dialog_id)?);
                    let step = frame.step_index;

                    if step >= dialog.step_count() {
                        Pending::EndTop(input)
                    } else {
                        let mut state = std::mem::take(&mut frame.state);
                        let result = dialog.run_step(step, &mut state, input, ctx).await;

                        let frame = stack.top_mut().ok_or(DialogError::EmptyStack)?;
                        frame.state = state;

                        match result? {
                            StepResult::Continue(value) => {
                                frame.step_index = step + 1;
                                Pending::Run(value)
                            }
                            StepResult::Prompt(options) => {
                                frame.step_index = step + 1;
                                ctx.send(options.prompt);
                                return Ok(TurnStatus::Waiting);
                            }
                            StepResult::Begin { dialog_id, options } => {
                                frame.step_index = step + 1;
                                Pending::Push { dialog_id, options }
                            }
                            StepResult::End(value) => Pending::EndTop(value),
                            StepResult::Replace { dialog_id, options } => {
                                stack.pop();
                                Pending::Push { dialog_id, options }
                            }
                        }
                    }
                }

                Pending::EndTop(value) => {
                    if let Some(frame) = stack.pop() {
                        tracing::debug!(dialog = %frame.dialog_id, "End dialog");
                    }
                    if stack.is_empty() {
                        return Ok(TurnStatus::Complete(value));
                    }
                    Pending::Run(value)
                }
            };
        }

        Err(DialogError::TransitionLimit(self.transition_limit))
    }
}
