//! Dialogs - the waterfall state machine and the bot's dialogs.
//!
//! ```text
//! main ──┬─► escalation   (feedback says ask agent, or rephrase limit hit)
//!        ├─► qna          (anything else with text)
//!        └─► feedback     (after every answer)
//! ```

mod escalation_dialog;
mod feedback_dialog;
mod machine;
mod main_dialog;
pub mod messages;
mod qna_dialog;

use std::sync::Arc;

pub use escalation_dialog::EscalationDialog;
pub use feedback_dialog::{feedback_card, FeedbackDialog};
pub use machine::{
    Dialog, DialogContext, DialogError, DialogMachine, DialogSet, TurnStatus,
    DEFAULT_TRANSITION_LIMIT,
};
pub use main_dialog::{escalate_options, MainDialog};
pub use qna_dialog::{low_score_variation, QnaDialog, QnaDialogSettings};

use crate::ports::{CardRenderer, QnaService};

pub const MAIN_DIALOG: &str = "main";
pub const QNA_DIALOG: &str = "qna";
pub const FEEDBACK_DIALOG: &str = "feedback";
pub const ESCALATION_DIALOG: &str = "escalation";

/// Builds the machine with every dialog registered and `main` as root.
pub fn build_dialog_machine(
    qna: Arc<dyn QnaService>,
    renderer: Arc<dyn CardRenderer>,
    negative_feedback_threshold: u32,
    qna_settings: QnaDialogSettings,
) -> DialogMachine {
    let dialogs = DialogSet::new()
        .with(Arc::new(MainDialog::new(negative_feedback_threshold)))
        .with(Arc::new(QnaDialog::new(qna, qna_settings)))
        .with(Arc::new(FeedbackDialog))
        .with(Arc::new(EscalationDialog::new(renderer)));

    DialogMachine::new(dialogs, MAIN_DIALOG)
}
