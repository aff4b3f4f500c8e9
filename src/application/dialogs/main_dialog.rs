//! Root dialog: feedback codes, question routing, and the feedback card.

use async_trait::async_trait;
use serde_json::Value;

use super::machine::{Dialog, DialogContext, DialogError};
use super::messages;
use super::{ESCALATION_DIALOG, FEEDBACK_DIALOG, MAIN_DIALOG, QNA_DIALOG};
use crate::domain::activity::FeedbackCode;
use crate::domain::dialog::{DialogValue, StepResult};

/// Options that start the main dialog straight into escalation.
pub fn escalate_options() -> DialogValue {
    DialogValue::Json(serde_json::json!({ "escalate": true }))
}

fn is_escalate_request(input: &DialogValue) -> bool {
    input
        .as_json()
        .and_then(|v| v.get("escalate"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Waterfall: interpret feedback, answer the question, ask for feedback.
pub struct MainDialog {
    negative_feedback_threshold: u32,
}

impl MainDialog {
    pub fn new(negative_feedback_threshold: u32) -> Self {
        Self {
            negative_feedback_threshold,
        }
    }

    fn feedback_step(&self, input: DialogValue, ctx: &mut DialogContext) -> StepResult {
        if is_escalate_request(&input) {
            ctx.send_text(messages::rephrase_limit(self.negative_feedback_threshold));
            return StepResult::begin(ESCALATION_DIALOG, DialogValue::Empty);
        }

        let code = input
            .as_activity()
            .and_then(|a| FeedbackCode::parse(a.text_or_empty()));

        match code {
            Some(FeedbackCode::Yes) => {
                ctx.send_text(messages::FEEDBACK_THANKS);
                StepResult::end()
            }
            Some(FeedbackCode::Rephrase) => {
                if ctx.feedback.threshold_crossed(self.negative_feedback_threshold) {
                    ctx.feedback.reset_negative();
                    ctx.send_text(messages::rephrase_limit(self.negative_feedback_threshold));
                    StepResult::begin(ESCALATION_DIALOG, DialogValue::Empty)
                } else {
                    ctx.feedback.record_negative();
                    tracing::debug!(
                        negative_count = ctx.feedback.negative_count,
                        "Negative feedback recorded"
                    );
                    ctx.send_text(messages::REPHRASE_PROMPT);
                    StepResult::end()
                }
            }
            Some(FeedbackCode::AskAgent) => {
                StepResult::begin(ESCALATION_DIALOG, DialogValue::Empty)
            }
            None => StepResult::Continue(input),
        }
    }
}

#[async_trait]
impl Dialog for MainDialog {
    fn id(&self) -> &str {
        MAIN_DIALOG
    }

    fn step_count(&self) -> usize {
        3
    }

    async fn run_step(
        &self,
        step: usize,
        _state: &mut Value,
        input: DialogValue,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        match step {
            0 => Ok(self.feedback_step(input, ctx)),
            1 => match input.question_text() {
                Some(question) => Ok(StepResult::begin(
                    QNA_DIALOG,
                    DialogValue::Text(question.to_string()),
                )),
                None => Ok(StepResult::end()),
            },
            2 => Ok(StepResult::begin(FEEDBACK_DIALOG, DialogValue::Empty)),
            _ => Err(DialogError::InvalidStep {
                dialog_id: MAIN_DIALOG.to_string(),
                step,
            }),
        }
    }
}
