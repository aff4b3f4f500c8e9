//! Sends the "Was this answer helpful?" card.

use async_trait::async_trait;
use serde_json::Value;

use super::machine::{Dialog, DialogContext, DialogError};
use super::messages;
use super::FEEDBACK_DIALOG;
use crate::domain::activity::{Activity, Attachment, CardAction, FeedbackCode, HeroCard};
use crate::domain::dialog::{DialogValue, StepResult};

/// The feedback card. Button labels double as the feedback codes.
pub fn feedback_card() -> Activity {
    let card = HeroCard::new()
        .with_text(messages::FEEDBACK_CARD_TEXT)
        .with_button(CardAction::message_back(FeedbackCode::Yes.label()))
        .with_button(CardAction::message_back(FeedbackCode::Rephrase.label()))
        .with_button(CardAction::message_back(FeedbackCode::AskAgent.label()));

    Activity::attachment(Attachment::hero(&card)).with_speak(messages::FEEDBACK_CARD_SPEAK)
}

pub struct FeedbackDialog;

#[async_trait]
impl Dialog for FeedbackDialog {
    fn id(&self) -> &str {
        FEEDBACK_DIALOG
    }

    fn step_count(&self) -> usize {
        1
    }

    async fn run_step(
        &self,
        _step: usize,
        _state: &mut Value,
        _input: DialogValue,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        ctx.send(feedback_card());
        Ok(StepResult::end())
    }
}
