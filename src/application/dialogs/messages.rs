//! User-facing texts sent by the dialogs and the turn pipeline.

pub const FEEDBACK_THANKS: &str = "Thanks for your feedback!";
pub const REPHRASE_PROMPT: &str = "Please rephrase your question and try again";
pub const TICKET_ACK: &str =
    "Thank you, you will receive your ticket number for your request shortly.";
pub const FILL_FORM_FIRST: &str = "Please fill up the form first";
pub const FILL_FORM_SPEAK: &str = "Fill the form to ask agent";

pub const FEEDBACK_CARD_TEXT: &str =
    "Was this answer helpful? \n\nIf not, please rephrase your question or Ask agent";
pub const FEEDBACK_CARD_SPEAK: &str = "Was this answer helpful?";

pub const NONE_OF_THE_ABOVE: &str = "None of the above.";
pub const NONE_OF_THE_ABOVE_ACK: &str = "Thanks for the feedback.";

pub const WELCOME_SPEAK: &str = "Welcome";

pub const GENERIC_APOLOGY: &str = "Sorry, something went wrong. Please try asking again.";

/// Sent when repeated rephrasing hands the user to an agent.
pub fn rephrase_limit(threshold: u32) -> String {
    format!(
        "You've asked to rephrase for {} times, why don't just ask agent?",
        threshold
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rephrase_limit_includes_threshold() {
        assert_eq!(
            rephrase_limit(3),
            "You've asked to rephrase for 3 times, why don't just ask agent?"
        );
    }
}
