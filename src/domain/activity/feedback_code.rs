//! Feedback codes posted back by the "Was this answer helpful?" card.
//!
//! The button label doubles as the code, so a user typing "rephrase" is
//! treated the same as pressing the button.

/// Texts that ask for a human agent.
pub const ASK_AGENT_SYNONYMS: [&str; 2] = ["ASK AGENT", "ESCALATE TO AGENT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCode {
    Yes,
    Rephrase,
    AskAgent,
}

impl FeedbackCode {
    /// Matches text against the known codes, ignoring case and surrounding whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_uppercase();
        match normalized.as_str() {
            "YES" => Some(FeedbackCode::Yes),
            "REPHRASE" => Some(FeedbackCode::Rephrase),
            other if ASK_AGENT_SYNONYMS.contains(&other) => Some(FeedbackCode::AskAgent),
            _ => None,
        }
    }

    /// Button label for this code.
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackCode::Yes => "Yes",
            FeedbackCode::Rephrase => "Rephrase",
            FeedbackCode::AskAgent => "Ask Agent",
        }
    }
}

/// True when the text is one of the ask-agent synonyms.
pub fn is_ask_agent(text: &str) -> bool {
    FeedbackCode::parse(text) == Some(FeedbackCode::AskAgent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(FeedbackCode::parse("yes"), Some(FeedbackCode::Yes));
        assert_eq!(FeedbackCode::parse("YES"), Some(FeedbackCode::Yes));
        assert_eq!(FeedbackCode::parse("RePhRaSe"), Some(FeedbackCode::Rephrase));
        assert_eq!(FeedbackCode::parse(" Ask Agent "), Some(FeedbackCode::AskAgent));
    }

    #[test]
    fn escalate_to_agent_is_a_synonym() {
        assert!(is_ask_agent("escalate to agent"));
        assert!(is_ask_agent("ASK AGENT"));
        assert!(!is_ask_agent("agent"));
    }

    #[test]
    fn questions_are_not_codes() {
        assert_eq!(FeedbackCode::parse("how do I reset my password"), None);
        assert_eq!(FeedbackCode::parse(""), None);
        assert_eq!(FeedbackCode::parse("no"), None);
    }

    #[test]
    fn labels_parse_back_to_their_code() {
        for code in [FeedbackCode::Yes, FeedbackCode::Rephrase, FeedbackCode::AskAgent] {
            assert_eq!(FeedbackCode::parse(code.label()), Some(code));
        }
    }
}
