//! Turn pipeline - one inbound activity in, the bot's replies out.
//!
//! Per turn: stamp the inbound activity, lock and load state for its keys,
//! run the dialog machine, log the exchange, persist, then hand any due
//! escalation to the background worker and persist the reset state.

use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use super::keyed_locks::KeyedLocks;
use super::recorder::TranscriptRecorder;
use crate::application::dialogs::{
    escalate_options, messages, DialogContext, DialogMachine, MAIN_DIALOG,
};
use crate::application::escalation::{EscalationJob, EscalationWorker};
use crate::config::{BotConfig, StateScope};
use crate::domain::activity::{Activity, ActivityKind};
use crate::domain::dialog::DialogStack;
use crate::domain::escalation::{EscalationKind, EscalationReport};
use crate::domain::foundation::{ConversationKey, StateKey, Timestamp, ValidationError};
use crate::domain::transcript::FeedbackState;
use crate::ports::{
    load_or_default, templates, to_entry, CardRenderer, DispatchPayload, RenderError,
    RenderedPayload, StateStorage, StateStorageError,
};

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Invalid activity: {0}")]
    InvalidActivity(#[from] ValidationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StateStorageError),
}

/// Pipeline knobs, taken from the `bot` config section.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub negative_feedback_threshold: u32,
    pub include_chat_transcript: bool,
    pub state_scope: StateScope,
    pub transcript_title: String,
    pub logo_url: Option<String>,
}

impl TurnSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            negative_feedback_threshold: config.negative_feedback_threshold,
            include_chat_transcript: config.include_chat_transcript,
            state_scope: config.state_scope,
            transcript_title: config.transcript_title.clone(),
            logo_url: config.logo_url.clone(),
        }
    }

    fn logo(&self) -> Option<&str> {
        self.logo_url.as_deref().filter(|l| !l.is_empty())
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&BotConfig::default())
    }
}

/// What one turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Replies, addressed to the inbound activity and stamped.
    pub outbound: Vec<Activity>,
    /// Dialog stack as persisted at the end of the turn.
    pub dialog_stack: DialogStack,
    /// Feedback state as persisted at the end of the turn.
    pub feedback: FeedbackState,
}

/// Keys one turn reads and writes.
struct TurnKeys {
    conversation: ConversationKey,
    dialog: StateKey,
    feedback: StateKey,
}

pub struct TurnPipeline {
    storage: Arc<dyn StateStorage>,
    machine: Arc<DialogMachine>,
    renderer: Arc<dyn CardRenderer>,
    worker: Arc<EscalationWorker>,
    settings: TurnSettings,
    locks: KeyedLocks,
}

impl TurnPipeline {
    pub fn new(
        storage: Arc<dyn StateStorage>,
        machine: Arc<DialogMachine>,
        renderer: Arc<dyn CardRenderer>,
        worker: Arc<EscalationWorker>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            storage,
            machine,
            renderer,
            worker,
            settings,
            locks: KeyedLocks::new(),
        }
    }

    pub fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    fn keys_for(&self, inbound: &Activity) -> Result<TurnKeys, ValidationError> {
        let conversation = inbound.conversation_key()?;
        let feedback = match self.settings.state_scope {
            StateScope::Conversation => StateKey::conversation_feedback(&conversation),
            StateScope::User => StateKey::user_feedback(&inbound.user_key()?),
        };
        Ok(TurnKeys {
            dialog: StateKey::dialog(&conversation),
            feedback,
            conversation,
        })
    }

    /// Processes one inbound activity end to end.
    pub async fn process_turn(&self, mut inbound: Activity) -> Result<TurnOutcome, TurnError> {
        inbound.stamp();
        let keys = self.keys_for(&inbound)?;
        let _guards = self
            .locks
            .lock_all(&[keys.dialog.clone(), keys.feedback.clone()])
            .await;

        let mut stack: DialogStack = load_or_default(self.storage.as_ref(), &keys.dialog).await?;
        let feedback: FeedbackState =
            load_or_default(self.storage.as_ref(), &keys.feedback).await?;

        tracing::debug!(
            conversation = %keys.conversation,
            kind = ?inbound.kind,
            depth = stack.len(),
            negative_count = feedback.negative_count,
            "Processing turn"
        );

        let mut recorder = TranscriptRecorder::new();
        recorder.record(&inbound);

        let mut ctx = DialogContext::new(inbound.clone(), feedback);
        match inbound.kind {
            ActivityKind::Message => {
                self.run_dialogs(&keys.conversation, &mut stack, &mut ctx)
                    .await
            }
            ActivityKind::ConversationUpdate => self.welcome(&mut ctx),
            _ => {}
        }

        let (mut feedback, mut outbound, form) = ctx.into_parts();
        for activity in &mut outbound {
            activity.address_reply_to(&inbound);
            activity.stamp();
            recorder.record(activity);
        }
        recorder.flush_into(&mut feedback);

        self.persist(&keys, &stack, &feedback).await?;

        if let Some(form) = form {
            tracing::info!(
                conversation = %keys.conversation,
                title = %form.title,
                "Escalation form submitted"
            );
            if self.escalate_submission(&keys.conversation, &mut feedback) {
                self.persist(&keys, &stack, &feedback).await?;
            }
        }

        if feedback.threshold_crossed(self.settings.negative_feedback_threshold) {
            let extra = self
                .escalate_transcript(&keys.conversation, &inbound, &mut stack, &mut feedback)
                .await;
            if let Some(extra) = extra {
                outbound.extend(extra);
                self.persist(&keys, &stack, &feedback).await?;
            }
        }

        Ok(TurnOutcome {
            outbound,
            dialog_stack: stack,
            feedback,
        })
    }

    /// Runs the dialog machine. Dialog failures never fail the turn: the
    /// stack is cleared and the user gets an apology.
    async fn run_dialogs(
        &self,
        conversation: &ConversationKey,
        stack: &mut DialogStack,
        ctx: &mut DialogContext,
    ) {
        match self.machine.continue_or_begin(stack, ctx).await {
            Ok(status) => {
                tracing::debug!(conversation = %conversation, status = ?status, "Dialog turn finished");
            }
            Err(e) => {
                tracing::error!(conversation = %conversation, error = %e, "Dialog failed, clearing stack");
                stack.clear();
                ctx.send_text(messages::GENERIC_APOLOGY);
            }
        }
    }

    /// Greets each newly added member other than the bot.
    fn welcome(&self, ctx: &mut DialogContext) {
        let newcomers = ctx.inbound().added_members_other_than_recipient().count();
        if newcomers == 0 {
            return;
        }

        let data = json!({ "logo": self.settings.logo().unwrap_or_default() });
        match self.renderer.render(templates::WELCOME, &data) {
            Ok(card) => {
                for _ in 0..newcomers {
                    ctx.send(
                        Activity::attachment(card.attachment.clone())
                            .with_speak(messages::WELCOME_SPEAK),
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to render welcome card"),
        }
    }

    async fn persist(
        &self,
        keys: &TurnKeys,
        stack: &DialogStack,
        feedback: &FeedbackState,
    ) -> Result<(), StateStorageError> {
        let entries = vec![
            to_entry(&keys.dialog, stack)?,
            to_entry(&keys.feedback, feedback)?,
        ];
        self.storage.save_all(entries).await.map_err(|e| {
            tracing::error!(conversation = %keys.conversation, error = %e, "Failed to persist turn state");
            e
        })
    }

    fn render_report(
        &self,
        template_id: &str,
        report: &EscalationReport,
    ) -> Option<RenderedPayload> {
        let rendered = report
            .to_value()
            .map_err(|e| RenderError::Serialization(e.to_string()))
            .and_then(|data| self.renderer.render(template_id, &data));
        match rendered {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(template = template_id, error = %e, "Failed to render escalation");
                None
            }
        }
    }

    fn submit(
        &self,
        conversation: &ConversationKey,
        kind: EscalationKind,
        rendered: RenderedPayload,
        subject: String,
    ) -> bool {
        self.worker.submit(EscalationJob {
            kind,
            conversation: conversation.clone(),
            payload: DispatchPayload {
                html: rendered.html,
                channel_json: rendered.channel_json,
                subject,
            },
        })
    }

    /// Dispatches a submitted form. Returns whether the state was reset.
    fn escalate_submission(
        &self,
        conversation: &ConversationKey,
        feedback: &mut FeedbackState,
    ) -> bool {
        let template_id = if self.settings.include_chat_transcript {
            templates::ESCALATION_SUBMIT
        } else {
            templates::ESCALATION_SUBMIT_NO_TRANSCRIPT
        };
        let report = EscalationReport::form_submission(feedback, self.settings.logo());

        let Some(rendered) = self.render_report(template_id, &report) else {
            return false;
        };
        let subject = report.subject(EscalationKind::FormSubmission);

        if !self.submit(conversation, EscalationKind::FormSubmission, rendered, subject) {
            return false;
        }
        feedback.reset_after_escalation();
        true
    }

    /// Dispatches the transcript after repeated negative feedback and restarts
    /// the main dialog in escalation mode. Returns the extra replies, or
    /// `None` when nothing changed.
    async fn escalate_transcript(
        &self,
        conversation: &ConversationKey,
        inbound: &Activity,
        stack: &mut DialogStack,
        feedback: &mut FeedbackState,
    ) -> Option<Vec<Activity>> {
        tracing::info!(
            conversation = %conversation,
            negative_count = feedback.negative_count,
            threshold = self.settings.negative_feedback_threshold,
            "Negative feedback threshold crossed"
        );

        let mut stamped = feedback.clone();
        stamped.timestamp = Some(Timestamp::now());
        let report =
            EscalationReport::transcript(&stamped, &self.settings.transcript_title, self.settings.logo());

        let rendered = self.render_report(templates::TRANSCRIPT, &report)?;
        let subject = report.subject(EscalationKind::Transcript);
        if !self.submit(conversation, EscalationKind::Transcript, rendered, subject) {
            return None;
        }
        *feedback = stamped;

        stack.clear();
        let mut ctx = DialogContext::new(inbound.clone(), feedback.clone());
        if let Err(e) = self
            .machine
            .begin(stack, &mut ctx, MAIN_DIALOG, escalate_options())
            .await
        {
            tracing::error!(conversation = %conversation, error = %e, "Failed to start escalation dialog");
            stack.clear();
            ctx.send_text(messages::GENERIC_APOLOGY);
        }

        let (restarted, mut extra, _) = ctx.into_parts();
        *feedback = restarted;
        feedback.reset_after_escalation();

        for activity in &mut extra {
            activity.address_reply_to(inbound);
            activity.stamp();
        }
        Some(extra)
    }
}
