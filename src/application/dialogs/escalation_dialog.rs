//! Collects the "ask agent" form.
//!
//! Step 0 shows the form. Step 1 takes the submission; anything that is not
//! a submission is either a request to see the form again or a new question
//! for the parent dialog.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::machine::{Dialog, DialogContext, DialogError};
use super::messages;
use super::ESCALATION_DIALOG;
use crate::domain::activity::{is_ask_agent, Activity};
use crate::domain::dialog::{DialogValue, PromptOptions, StepResult};
use crate::domain::escalation::EscalationForm;
use crate::domain::foundation::Timestamp;
use crate::ports::{templates, CardRenderer};

pub struct EscalationDialog {
    renderer: Arc<dyn CardRenderer>,
}

impl EscalationDialog {
    pub fn new(renderer: Arc<dyn CardRenderer>) -> Self {
        Self { renderer }
    }

    fn form_prompt(&self) -> Activity {
        match self.renderer.render(templates::ESCALATION_INPUT, &json!({})) {
            Ok(rendered) => {
                Activity::attachment(rendered.attachment).with_speak(messages::FILL_FORM_SPEAK)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Escalation form failed to render, prompting with text");
                Activity::message(messages::FILL_FORM_SPEAK).with_speak(messages::FILL_FORM_SPEAK)
            }
        }
    }

    fn handle_reply(&self, input: DialogValue, ctx: &mut DialogContext) -> StepResult {
        let Some(activity) = input.as_activity() else {
            return StepResult::End(input);
        };

        if let Some(submission) = activity.structured_value() {
            let submitted_at = activity.timestamp.unwrap_or_else(Timestamp::now);
            return match EscalationForm::from_submission(submission, submitted_at) {
                Ok(form) => {
                    tracing::info!(title = %form.title, "Escalation form submitted");
                    ctx.feedback.record_submission(&form);
                    ctx.send_text(messages::TICKET_ACK);
                    ctx.request_escalation(form);
                    StepResult::end()
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed escalation form");
                    ctx.send_text(messages::FILL_FORM_FIRST);
                    StepResult::replace(ESCALATION_DIALOG, DialogValue::Empty)
                }
            };
        }

        if is_ask_agent(activity.text_or_empty()) {
            return StepResult::replace(ESCALATION_DIALOG, DialogValue::Empty);
        }

        // Not a submission: hand the activity back so it is answered as a question
        StepResult::End(input)
    }
}

#[async_trait]
impl Dialog for EscalationDialog {
    fn id(&self) -> &str {
        ESCALATION_DIALOG
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(
        &self,
        step: usize,
        _state: &mut Value,
        input: DialogValue,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        match step {
            0 => Ok(StepResult::Prompt(PromptOptions::new(self.form_prompt()))),
            1 => Ok(self.handle_reply(input, ctx)),
            _ => Err(DialogError::InvalidStep {
                dialog_id: ESCALATION_DIALOG.to_string(),
                step,
            }),
        }
    }
}
