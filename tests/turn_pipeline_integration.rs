//! Integration tests for the turn pipeline.
//!
//! These tests drive whole conversations through the pipeline with in-memory
//! storage, a mock QnA backend and recording escalation channels:
//! 1. Feedback codes update the counter and reply as expected
//! 2. Repeated "rephrase" escalates the transcript and prompts for the form
//! 3. The escalation form is dispatched and clears accumulated state
//! 4. Channel failures never reach the user

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use qna_escalation::adapters::escalation::RecordingChannel;
use qna_escalation::adapters::qna::MockQnaService;
use qna_escalation::adapters::rendering::TemplateCardRenderer;
use qna_escalation::adapters::storage::{FileStateStorage, InMemoryStateStorage};
use qna_escalation::application::dialogs::{build_dialog_machine, messages, QnaDialogSettings};
use qna_escalation::application::escalation::{EscalationDispatcher, EscalationWorker};
use qna_escalation::application::pipeline::{TurnError, TurnPipeline, TurnSettings};
use qna_escalation::config::{BotConfig, QnaConfig};
use qna_escalation::domain::activity::{Activity, ADAPTIVE_CARD_CONTENT_TYPE};
use qna_escalation::domain::dialog::DialogStack;
use qna_escalation::domain::foundation::{ConversationKey, StateKey};
use qna_escalation::domain::transcript::FeedbackState;
use qna_escalation::ports::{
    load_or_default, templates, CardRenderer, EscalationChannel, QnaAnswer, RenderError,
    RenderedPayload, StateStorage, StateStorageError,
};

use async_trait::async_trait;
use serde_json::Value;

// =============================================================================
// Test Infrastructure
// =============================================================================

const CONVERSATION: &str = "conv-1";

struct Bot {
    pipeline: TurnPipeline,
    storage: Arc<dyn StateStorage>,
    worker: Arc<EscalationWorker>,
    qna: MockQnaService,
}

fn qna() -> MockQnaService {
    MockQnaService::new()
        .with_answer("what is a refund", QnaAnswer::new("Money back within 5 days.", 0.9))
        .with_answer("how do I reset my password", QnaAnswer::new("Use the reset link.", 0.92))
}

fn bot_with(
    storage: Arc<dyn StateStorage>,
    channels: Vec<Arc<dyn EscalationChannel>>,
    settings: TurnSettings,
) -> Bot {
    bot_rendering_with(storage, channels, settings, Arc::new(TemplateCardRenderer::new()))
}

fn bot_rendering_with(
    storage: Arc<dyn StateStorage>,
    channels: Vec<Arc<dyn EscalationChannel>>,
    settings: TurnSettings,
    renderer: Arc<dyn CardRenderer>,
) -> Bot {
    let qna = qna();
    let machine = build_dialog_machine(
        Arc::new(qna.clone()),
        Arc::clone(&renderer),
        settings.negative_feedback_threshold,
        QnaDialogSettings::from_config(&QnaConfig::default(), &BotConfig::default()),
    );
    let dispatcher = EscalationDispatcher::new(channels, Duration::from_secs(5));
    let worker = Arc::new(EscalationWorker::new(Arc::new(dispatcher), 2));

    Bot {
        pipeline: TurnPipeline::new(
            Arc::clone(&storage),
            Arc::new(machine),
            renderer,
            Arc::clone(&worker),
            settings,
        ),
        storage,
        worker,
        qna,
    }
}

fn bot(channel: &RecordingChannel, threshold: u32) -> Bot {
    bot_with(
        Arc::new(InMemoryStateStorage::new()),
        vec![Arc::new(channel.clone())],
        TurnSettings {
            negative_feedback_threshold: threshold,
            ..TurnSettings::default()
        },
    )
}

fn user_says(text: &str) -> Activity {
    Activity::message(text)
        .with_from("user-1", Some("Alice".to_string()))
        .with_recipient("bot", Some("Helpdesk".to_string()))
        .with_conversation(CONVERSATION)
}

fn form_submission(value: Value) -> Activity {
    let mut activity = user_says("");
    activity.text = None;
    activity.with_value(value)
}

fn texts(outbound: &[Activity]) -> Vec<&str> {
    outbound.iter().filter_map(|a| a.text.as_deref()).collect()
}

fn is_form_prompt(activity: &Activity) -> bool {
    activity
        .attachments
        .first()
        .map(|a| a.content_type == ADAPTIVE_CARD_CONTENT_TYPE)
        .unwrap_or(false)
        && activity.speak.as_deref() == Some(messages::FILL_FORM_SPEAK)
}

async fn stored_feedback(bot: &Bot) -> FeedbackState {
    let key = StateKey::conversation_feedback(&ConversationKey::new(CONVERSATION).unwrap());
    load_or_default(bot.storage.as_ref(), &key).await.unwrap()
}

async fn stored_stack(bot: &Bot) -> DialogStack {
    let key = StateKey::dialog(&ConversationKey::new(CONVERSATION).unwrap());
    load_or_default(bot.storage.as_ref(), &key).await.unwrap()
}

/// Bundled templates, except one that always fails to render.
struct BrokenTemplate {
    inner: TemplateCardRenderer,
    broken: &'static str,
}

impl CardRenderer for BrokenTemplate {
    fn render(&self, template_id: &str, data: &Value) -> Result<RenderedPayload, RenderError> {
        if template_id == self.broken {
            return Err(RenderError::InvalidTemplate {
                template_id: template_id.to_string(),
                reason: "broken for test".to_string(),
            });
        }
        self.inner.render(template_id, data)
    }
}

fn bot_with_broken_template(channel: &RecordingChannel, broken: &'static str) -> Bot {
    bot_rendering_with(
        Arc::new(InMemoryStateStorage::new()),
        vec![Arc::new(channel.clone())],
        TurnSettings {
            negative_feedback_threshold: 3,
            ..TurnSettings::default()
        },
        Arc::new(BrokenTemplate {
            inner: TemplateCardRenderer::new(),
            broken,
        }),
    )
}

/// Storage that reads fine but refuses every write.
struct ReadOnlyStorage;

#[async_trait]
impl StateStorage for ReadOnlyStorage {
    async fn load(&self, _key: &StateKey) -> Result<Option<Value>, StateStorageError> {
        Ok(None)
    }

    async fn save(&self, _key: &StateKey, _value: Value) -> Result<(), StateStorageError> {
        Err(StateStorageError::Unavailable("read only".to_string()))
    }

    async fn delete(&self, _key: &StateKey) -> Result<(), StateStorageError> {
        Ok(())
    }
}

// =============================================================================
// Feedback codes
// =============================================================================

#[tokio::test]
async fn yes_thanks_user_and_keeps_counter() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();

    let outcome = bot.pipeline.process_turn(user_says("yes")).await.unwrap();

    assert_eq!(texts(&outcome.outbound), vec![messages::FEEDBACK_THANKS]);
    assert_eq!(stored_feedback(&bot).await.negative_count, 1);
    assert_eq!(bot.qna.call_count(), 0);
}

#[tokio::test]
async fn rephrase_below_threshold_counts_and_prompts() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);

    let outcome = bot.pipeline.process_turn(user_says("Rephrase")).await.unwrap();

    assert_eq!(texts(&outcome.outbound), vec![messages::REPHRASE_PROMPT]);
    assert_eq!(stored_feedback(&bot).await.negative_count, 1);
    assert!(stored_stack(&bot).await.is_empty());
}

#[tokio::test]
async fn question_is_answered_with_feedback_card() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);

    let outcome = bot
        .pipeline
        .process_turn(user_says("How do I reset my password?"))
        .await
        .unwrap();

    assert_eq!(outcome.outbound[0].text.as_deref(), Some("Use the reset link."));
    let card = outcome.outbound[1].attachments[0].as_hero_card().unwrap();
    assert_eq!(card.button_titles(), vec!["Yes", "Rephrase", "Ask Agent"]);

    let feedback = stored_feedback(&bot).await;
    assert_eq!(feedback.chats[0].message, "How do I reset my password?");
    assert_eq!(feedback.chats[1].message, "Use the reset link.");
}

// =============================================================================
// Threshold escalation
// =============================================================================

#[tokio::test]
async fn repeated_rephrase_escalates_transcript() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);

    bot.pipeline.process_turn(user_says("what is a refund")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    let outcome = bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.worker.flush().await;

    let limit = messages::rephrase_limit(3);
    assert!(texts(&outcome.outbound).contains(&limit.as_str()));
    assert!(outcome.outbound.iter().any(is_form_prompt));

    let feedback = stored_feedback(&bot).await;
    assert_eq!(feedback.negative_count, 0);
    assert!(feedback.chats.is_empty());
    assert_eq!(stored_stack(&bot).await.dialog_ids(), vec!["main", "escalation"]);

    let delivered = channel.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "Escalation Chat Transcript");
    assert!(delivered[0].html.contains("Money back within 5 days."));
    let envelope: Value = serde_json::from_str(&delivered[0].channel_json).unwrap();
    assert_eq!(envelope["attachments"][0]["contentType"], ADAPTIVE_CARD_CONTENT_TYPE);
}

#[tokio::test]
async fn transcript_render_failure_keeps_counters_for_retry() {
    let channel = RecordingChannel::new("recording");
    let bot = bot_with_broken_template(&channel, templates::TRANSCRIPT);

    bot.pipeline.process_turn(user_says("what is a refund")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    let outcome = bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.worker.flush().await;

    assert_eq!(texts(&outcome.outbound), vec![messages::REPHRASE_PROMPT]);
    assert!(!outcome.outbound.iter().any(is_form_prompt));

    let feedback = stored_feedback(&bot).await;
    assert_eq!(feedback.negative_count, 3);
    assert_eq!(feedback.chats[0].message, "what is a refund");
    assert!(feedback.chats.iter().any(|c| c.message == "REPHRASE"));
    assert_eq!(channel.delivery_count(), 0);
}

#[tokio::test]
async fn zero_threshold_never_escalates_automatically() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 0);

    for _ in 0..5 {
        bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    }
    bot.worker.flush().await;

    assert_eq!(stored_feedback(&bot).await.negative_count, 5);
    assert_eq!(channel.delivery_count(), 0);
}

// =============================================================================
// Escalation form
// =============================================================================

#[tokio::test]
async fn ask_agent_prompts_for_form() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);

    let outcome = bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();

    assert_eq!(outcome.outbound.len(), 1);
    assert!(is_form_prompt(&outcome.outbound[0]));
    assert_eq!(stored_stack(&bot).await.dialog_ids(), vec!["main", "escalation"]);
}

#[tokio::test]
async fn form_submission_dispatches_and_clears_state() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);
    bot.pipeline.process_turn(user_says("what is a refund")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.pipeline.process_turn(user_says("Ask Agent")).await.unwrap();

    let outcome = bot
        .pipeline
        .process_turn(form_submission(json!({
            "title": "Refund missing",
            "details": "It has been two weeks"
        })))
        .await
        .unwrap();
    bot.worker.flush().await;

    assert_eq!(texts(&outcome.outbound), vec![messages::TICKET_ACK]);

    let feedback = stored_feedback(&bot).await;
    assert_eq!(feedback.negative_count, 0);
    assert!(feedback.chats.is_empty());
    assert_eq!(feedback.title.as_deref(), Some("Refund missing"));
    assert!(stored_stack(&bot).await.is_empty());

    let delivered = channel.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "Refund missing");
    assert!(delivered[0].html.contains("It has been two weeks"));
    assert!(delivered[0].html.contains("what is a refund"));
}

#[tokio::test]
async fn submission_render_failure_keeps_state() {
    let channel = RecordingChannel::new("recording");
    let bot = bot_with_broken_template(&channel, templates::ESCALATION_SUBMIT);
    bot.pipeline.process_turn(user_says("what is a refund")).await.unwrap();
    bot.pipeline.process_turn(user_says("REPHRASE")).await.unwrap();
    bot.pipeline.process_turn(user_says("Ask Agent")).await.unwrap();

    let outcome = bot
        .pipeline
        .process_turn(form_submission(json!({
            "title": "Refund missing",
            "details": "It has been two weeks"
        })))
        .await
        .unwrap();
    bot.worker.flush().await;

    assert_eq!(texts(&outcome.outbound), vec![messages::TICKET_ACK]);

    let feedback = stored_feedback(&bot).await;
    assert_eq!(feedback.negative_count, 1);
    assert_eq!(feedback.chats[0].message, "what is a refund");
    assert_eq!(feedback.title.as_deref(), Some("Refund missing"));
    assert_eq!(channel.delivery_count(), 0);
}

#[tokio::test]
async fn malformed_submission_reprompts() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);
    bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();

    let outcome = bot
        .pipeline
        .process_turn(form_submission(json!({"title": "Only a title"})))
        .await
        .unwrap();
    bot.worker.flush().await;

    assert_eq!(outcome.outbound[0].text.as_deref(), Some(messages::FILL_FORM_FIRST));
    assert!(is_form_prompt(&outcome.outbound[1]));
    assert_eq!(stored_stack(&bot).await.dialog_ids(), vec!["main", "escalation"]);
    assert_eq!(channel.delivery_count(), 0);
}

#[tokio::test]
async fn abandoning_form_answers_new_question() {
    let channel = RecordingChannel::new("recording");
    let bot = bot(&channel, 3);
    bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();

    let outcome = bot
        .pipeline
        .process_turn(user_says("what is a refund"))
        .await
        .unwrap();

    assert_eq!(bot.qna.calls(), vec!["what is a refund"]);
    assert_eq!(
        outcome.outbound[0].text.as_deref(),
        Some("Money back within 5 days.")
    );
    assert!(stored_stack(&bot).await.is_empty());
}

#[tokio::test]
async fn submission_without_transcript_omits_chats() {
    let channel = RecordingChannel::new("recording");
    let bot = bot_with(
        Arc::new(InMemoryStateStorage::new()),
        vec![Arc::new(channel.clone())],
        TurnSettings {
            include_chat_transcript: false,
            ..TurnSettings::default()
        },
    );
    bot.pipeline.process_turn(user_says("what is a refund")).await.unwrap();
    bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();

    bot.pipeline
        .process_turn(form_submission(json!({"title": "T", "details": "D"})))
        .await
        .unwrap();
    bot.worker.flush().await;

    let delivered = channel.delivered();
    assert_eq!(delivered.len(), 1);
    assert!(!delivered[0].html.contains("what is a refund"));
}

// =============================================================================
// Dispatch isolation and persistence
// =============================================================================

#[tokio::test]
async fn failing_channels_do_not_block_others() {
    let disabled = RecordingChannel::new("email").disabled();
    let failing = RecordingChannel::new("webhook").rejecting(502);
    let working = RecordingChannel::new("recording");
    let bot = bot_with(
        Arc::new(InMemoryStateStorage::new()),
        vec![
            Arc::new(disabled.clone()),
            Arc::new(failing),
            Arc::new(working.clone()),
        ],
        TurnSettings::default(),
    );
    bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();

    let outcome = bot
        .pipeline
        .process_turn(form_submission(json!({"title": "T", "details": "D"})))
        .await
        .unwrap();
    bot.worker.flush().await;

    assert_eq!(texts(&outcome.outbound), vec![messages::TICKET_ACK]);
    assert_eq!(disabled.delivery_count(), 0);
    assert_eq!(working.delivery_count(), 1);
}

#[tokio::test]
async fn persistence_failure_aborts_turn() {
    let channel = RecordingChannel::new("recording");
    let bot = bot_with(
        Arc::new(ReadOnlyStorage),
        vec![Arc::new(channel)],
        TurnSettings::default(),
    );

    let err = bot
        .pipeline
        .process_turn(user_says("what is a refund"))
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Persistence(_)));
}

#[tokio::test]
async fn state_survives_restart_with_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let channel = RecordingChannel::new("recording");

    {
        let bot = bot_with(
            Arc::new(FileStateStorage::new(dir.path())),
            vec![Arc::new(channel.clone())],
            TurnSettings::default(),
        );
        bot.pipeline.process_turn(user_says("ask agent")).await.unwrap();
    }

    let bot = bot_with(
        Arc::new(FileStateStorage::new(dir.path())),
        vec![Arc::new(channel.clone())],
        TurnSettings::default(),
    );
    let outcome = bot
        .pipeline
        .process_turn(form_submission(json!({"title": "T", "details": "D"})))
        .await
        .unwrap();
    bot.worker.flush().await;

    assert_eq!(texts(&outcome.outbound), vec![messages::TICKET_ACK]);
    assert_eq!(channel.delivery_count(), 1);
}

#[tokio::test]
async fn concurrent_turns_for_one_conversation_serialize() {
    let channel = RecordingChannel::new("recording");
    let bot = Arc::new(bot(&channel, 0));

    let turns: Vec<_> = (0..8)
        .map(|_| {
            let bot = Arc::clone(&bot);
            tokio::spawn(async move { bot.pipeline.process_turn(user_says("REPHRASE")).await })
        })
        .collect();
    for turn in turns {
        turn.await.unwrap().unwrap();
    }

    assert_eq!(stored_feedback(&bot).await.negative_count, 8);
}

#[tokio::test]
async fn rendering_is_deterministic() {
    let renderer = TemplateCardRenderer::new();
    let data = json!({
        "title": "T", "details": "D", "name": "Alice", "dateTime": "now",
        "logo": "", "negativeFeedbackCount": 1,
        "chats": [{"sender": "USER", "message": "hi"}]
    });

    let first = renderer.render(templates::ESCALATION_SUBMIT, &data).unwrap();
    let second = renderer.render(templates::ESCALATION_SUBMIT, &data).unwrap();

    assert_eq!(first, second);
}
