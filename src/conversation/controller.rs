//! Conversation controller: submission gating over the transcript.
//!
//! [`ConversationState`] is a pure state machine. The widget coordinator
//! drives the remote call for an accepted [`Submission`] and feeds the
//! outcome back through [`ConversationState::resolve_success`] /
//! [`ConversationState::resolve_failure`]; exactly one of the two is
//! called per acceptance, so every accepted submission yields exactly one
//! assistant message and the pending flag always returns to false.

use crate::capability::query::QueryResponse;
use crate::config::ConversationConfig;
use crate::conversation::transcript::{Message, Role, Transcript};
use tracing::debug;

/// An accepted submission, handed to the coordinator to run remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Sequence number of this submission within the conversation.
    pub id: u64,
    /// Trimmed question text.
    pub text: String,
}

/// Per-conversation state: transcript, pending flag, input buffer.
#[derive(Debug)]
pub struct ConversationState {
    config: ConversationConfig,
    transcript: Transcript,
    pending: bool,
    submission_seq: u64,
    input_buffer: String,
}

impl ConversationState {
    /// Create a conversation seeded with the configured greeting.
    pub fn new(config: ConversationConfig) -> Self {
        let mut transcript = Transcript::new();
        transcript.append(Role::Assistant, &config.greeting, None);
        Self {
            config,
            transcript,
            pending: false,
            submission_seq: 0,
            input_buffer: String::new(),
        }
    }

    /// All messages in display order.
    pub fn transcript(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Look up a message by id.
    pub fn message(&self, id: u64) -> Option<&Message> {
        self.transcript.get(id)
    }

    /// Whether a submission is awaiting its response.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Current input buffer contents.
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Overwrite the input buffer (typing and voice transcripts share it).
    pub fn set_input_buffer(&mut self, text: impl Into<String>) {
        self.input_buffer = text.into();
    }

    /// Try to accept a submission of `text`.
    ///
    /// Rejected — `None`, no state change, no remote call — when the
    /// trimmed text is empty or another submission is already pending.
    /// On acceptance the user message is appended, the input buffer is
    /// cleared and the pending flag raised; the returned [`Submission`]
    /// carries what the coordinator must send to the query service.
    pub fn submit(&mut self, text: &str) -> Option<(Message, Submission)> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.pending {
            debug!("submission rejected: a request is already in flight");
            return None;
        }

        let message = self.transcript.append(Role::User, trimmed, None);
        self.input_buffer.clear();
        self.pending = true;
        self.submission_seq += 1;
        Some((
            message,
            Submission {
                id: self.submission_seq,
                text: trimmed.to_owned(),
            },
        ))
    }

    /// Append the assistant answer for the outstanding submission.
    ///
    /// An empty answer is replaced by the configured rephrase text — the
    /// backend occasionally returns 200 with nothing to say.
    pub fn resolve_success(&mut self, response: QueryResponse) -> Message {
        self.pending = false;
        let text = if response.answer_text.trim().is_empty() {
            self.config.rephrase_reply.clone()
        } else {
            response.answer_text
        };
        self.transcript
            .append(Role::Assistant, text, response.provider_tag)
    }

    /// Append the fixed apology fallback for the outstanding submission.
    pub fn resolve_failure(&mut self) -> Message {
        self.pending = false;
        self.transcript
            .append(Role::Assistant, &self.config.fallback_reply, None)
    }

    /// Reset the transcript to a single post-clear greeting.
    ///
    /// Does not touch the pending flag: an in-flight submission still
    /// resolves, and its answer is appended after the greeting.
    pub fn clear(&mut self) -> Message {
        self.transcript.reset(&self.config.cleared_greeting)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn state() -> ConversationState {
        ConversationState::new(ConversationConfig::default())
    }

    fn answer(text: &str) -> QueryResponse {
        QueryResponse {
            answer_text: text.to_owned(),
            provider_tag: Some("mock".to_owned()),
        }
    }

    #[test]
    fn starts_with_greeting_only() {
        let state = state();
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript()[0].role, Role::Assistant);
        assert!(!state.pending());
        assert!(state.input_buffer().is_empty());
    }

    #[test]
    fn accepted_submit_appends_user_message_and_clears_buffer() {
        let mut state = state();
        state.set_input_buffer("  Explain binary search  ");

        let (message, submission) = state.submit("  Explain binary search  ").unwrap();
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text, "Explain binary search");
        assert_eq!(submission.text, "Explain binary search");
        assert!(state.pending());
        assert!(state.input_buffer().is_empty());
        assert_eq!(state.transcript().len(), 2);
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut state = state();
        state.set_input_buffer("   ");
        assert!(state.submit("   ").is_none());
        assert_eq!(state.transcript().len(), 1);
        assert!(!state.pending());
        // Rejection must not clear the buffer.
        assert_eq!(state.input_buffer(), "   ");
    }

    #[test]
    fn second_submit_while_pending_is_a_no_op() {
        let mut state = state();
        assert!(state.submit("first").is_some());
        assert!(state.submit("second").is_none());
        assert_eq!(state.transcript().len(), 2);
    }

    #[test]
    fn success_appends_exactly_one_assistant_message() {
        let mut state = state();
        state.submit("what is a heap").unwrap();

        let message = state.resolve_success(answer("A heap is a tree."));
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text, "A heap is a tree.");
        assert_eq!(message.source_provider.as_deref(), Some("mock"));
        assert!(!state.pending());
        assert_eq!(state.transcript().len(), 3);
    }

    #[test]
    fn failure_appends_fallback_and_drops_pending() {
        let mut state = state();
        state.submit("what is a heap").unwrap();

        let message = state.resolve_failure();
        assert_eq!(
            message.text,
            ConversationConfig::default().fallback_reply
        );
        assert!(!state.pending());
        assert_eq!(state.transcript().len(), 3);
    }

    #[test]
    fn empty_answer_becomes_rephrase_reply() {
        let mut state = state();
        state.submit("hm").unwrap();
        let message = state.resolve_success(answer("   "));
        assert_eq!(message.text, ConversationConfig::default().rephrase_reply);
    }

    #[test]
    fn submit_allowed_again_after_resolution() {
        let mut state = state();
        state.submit("one").unwrap();
        state.resolve_failure();
        assert!(state.submit("two").is_some());
    }

    #[test]
    fn clear_reseeds_greeting_but_keeps_pending() {
        let mut state = state();
        state.submit("slow question").unwrap();

        let greeting = state.clear();
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(
            greeting.text,
            ConversationConfig::default().cleared_greeting
        );
        assert!(state.pending());

        // The in-flight response still lands, after the greeting.
        let message = state.resolve_success(answer("late answer"));
        assert_eq!(state.transcript().len(), 2);
        assert_eq!(state.transcript()[1].text, "late answer");
        assert!(message.id > greeting.id);
        assert!(!state.pending());
    }

    #[test]
    fn transcript_order_is_submission_order() {
        let mut state = state();
        for i in 0..3 {
            state.submit(&format!("question {i}")).unwrap();
            state.resolve_success(answer(&format!("answer {i}")));
        }
        let texts: Vec<&str> = state
            .transcript()
            .iter()
            .skip(1)
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(
            texts,
            vec![
                "question 0",
                "answer 0",
                "question 1",
                "answer 1",
                "question 2",
                "answer 2"
            ]
        );
    }
}
