//! Answers a question from the knowledge base.
//!
//! Close-scoring answers are offered as "Did you mean:" suggestions; the
//! user's pick is resolved on the next turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::machine::{Dialog, DialogContext, DialogError};
use super::messages;
use super::QNA_DIALOG;
use crate::config::{BotConfig, QnaConfig};
use crate::domain::activity::{Activity, Attachment, CardAction, HeroCard};
use crate::domain::dialog::{DialogValue, PromptOptions, StepResult};
use crate::domain::transcript::DID_YOU_MEAN_TITLE;
use crate::ports::{QnaAnswer, QnaService};

const MAXIMUM_SCORE_FOR_LOW_SCORE_VARIATION: f64 = 95.0;
const MINIMUM_SCORE_FOR_LOW_SCORE_VARIATION: f64 = 20.0;
const PREVIOUS_LOW_SCORE_VARIATION_MULTIPLIER: f64 = 0.7;
const MAX_LOW_SCORE_VARIATION_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct QnaDialogSettings {
    pub score_threshold: f64,
    pub default_answer: String,
    pub display_precise_answer_only: bool,
}

impl QnaDialogSettings {
    pub fn from_config(qna: &QnaConfig, bot: &BotConfig) -> Self {
        Self {
            score_threshold: qna.score_threshold,
            default_answer: bot.default_answer.clone(),
            display_precise_answer_only: qna.display_precise_answer_only,
        }
    }
}

/// Suggestions offered on the previous turn.
#[derive(Debug, Default, Serialize, Deserialize)]
struct QnaFrameState {
    #[serde(default)]
    suggestions: Vec<QnaAnswer>,
}

fn include_for_clustering(prev: f64, current: f64, multiplier: f64) -> bool {
    (prev - current) < multiplier * prev.sqrt()
}

/// Answers whose scores sit close enough to the top answer to be ambiguous.
///
/// Expects answers sorted best first. A top score above 95 keeps only the
/// top answer; a top score of 20 or less keeps nothing.
pub fn low_score_variation(answers: &[QnaAnswer]) -> Vec<QnaAnswer> {
    let Some(top) = answers.first() else {
        return Vec::new();
    };

    let top_score = top.score * 100.0;
    if top_score > MAXIMUM_SCORE_FOR_LOW_SCORE_VARIATION {
        return vec![top.clone()];
    }
    if top_score <= MINIMUM_SCORE_FOR_LOW_SCORE_VARIATION {
        return Vec::new();
    }

    let mut kept = vec![top.clone()];
    let mut prev_score = top_score;
    for answer in &answers[1..] {
        let current = answer.score * 100.0;
        if include_for_clustering(prev_score, current, PREVIOUS_LOW_SCORE_VARIATION_MULTIPLIER)
            && include_for_clustering(top_score, current, MAX_LOW_SCORE_VARIATION_MULTIPLIER)
        {
            prev_score = current;
            kept.push(answer.clone());
        }
    }
    kept
}

pub struct QnaDialog {
    qna: Arc<dyn QnaService>,
    settings: QnaDialogSettings,
}

impl QnaDialog {
    pub fn new(qna: Arc<dyn QnaService>, settings: QnaDialogSettings) -> Self {
        Self { qna, settings }
    }

    fn answer_activity(&self, answer: &QnaAnswer) -> Activity {
        let text = match (&answer.precise_answer, self.settings.display_precise_answer_only) {
            (Some(precise), true) => precise.clone(),
            _ => answer.answer.clone(),
        };

        let mut activity = Activity::message(text);
        if !answer.prompts.is_empty() {
            let card = answer
                .prompts
                .iter()
                .fold(HeroCard::new(), |card, p| {
                    card.with_button(CardAction::im_back(p.display_text.clone()))
                });
            activity.attachments.push(Attachment::hero(&card));
        }
        activity
    }

    fn suggestions_activity(suggestions: &[QnaAnswer]) -> Activity {
        let card = suggestions
            .iter()
            .fold(HeroCard::new().with_title(DID_YOU_MEAN_TITLE), |card, s| {
                card.with_button(CardAction::im_back(s.suggestion_title()))
            })
            .with_button(CardAction::im_back(messages::NONE_OF_THE_ABOVE));

        let mut activity = Activity::attachment(Attachment::hero(&card)).with_speak(DID_YOU_MEAN_TITLE);
        activity.text = Some(DID_YOU_MEAN_TITLE.to_string());
        activity
    }

    async fn ask(
        &self,
        question: &str,
        state: &mut Value,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        let result = match self.qna.query(question).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "QnA query failed, sending default answer");
                ctx.send_text(self.settings.default_answer.clone());
                return Ok(StepResult::end());
            }
        };

        let answers = result.above(self.settings.score_threshold);
        let candidates = match answers.first() {
            Some(top) if top.score * 100.0 <= MAXIMUM_SCORE_FOR_LOW_SCORE_VARIATION => {
                low_score_variation(&answers)
            }
            _ => answers,
        };

        match candidates.as_slice() {
            [] => {
                ctx.send_text(self.settings.default_answer.clone());
                Ok(StepResult::end())
            }
            [single] => {
                ctx.send(self.answer_activity(single));
                Ok(StepResult::end())
            }
            many => {
                tracing::debug!(suggestions = many.len(), "Offering answer suggestions");
                let prompt = Self::suggestions_activity(many);
                *state = serde_json::to_value(QnaFrameState {
                    suggestions: many.to_vec(),
                })
                .map_err(|e| DialogError::InvalidState {
                    dialog_id: QNA_DIALOG.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(StepResult::Prompt(PromptOptions::new(prompt)))
            }
        }
    }

    fn resolve_choice(
        &self,
        choice: &str,
        state: &Value,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        if choice.eq_ignore_ascii_case(messages::NONE_OF_THE_ABOVE) {
            ctx.send_text(messages::NONE_OF_THE_ABOVE_ACK);
            return Ok(StepResult::end());
        }

        let frame: QnaFrameState = if state.is_null() {
            QnaFrameState::default()
        } else {
            serde_json::from_value(state.clone()).map_err(|e| DialogError::InvalidState {
                dialog_id: QNA_DIALOG.to_string(),
                reason: e.to_string(),
            })?
        };

        match frame
            .suggestions
            .iter()
            .find(|s| s.suggestion_title().eq_ignore_ascii_case(choice))
        {
            Some(picked) => {
                ctx.send(self.answer_activity(picked));
                Ok(StepResult::end())
            }
            None => Ok(StepResult::replace(
                QNA_DIALOG,
                DialogValue::Text(choice.to_string()),
            )),
        }
    }
}

#[async_trait]
impl Dialog for QnaDialog {
    fn id(&self) -> &str {
        QNA_DIALOG
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(
        &self,
        step: usize,
        state: &mut Value,
        input: DialogValue,
        ctx: &mut DialogContext,
    ) -> Result<StepResult, DialogError> {
        let Some(text) = input.question_text().map(str::to_string) else {
            return Ok(StepResult::end());
        };

        match step {
            0 => self.ask(&text, state, ctx).await,
            1 => self.resolve_choice(&text, state, ctx),
            _ => Err(DialogError::InvalidStep {
                dialog_id: QNA_DIALOG.to_string(),
                step,
            }),
        }
    }
}
