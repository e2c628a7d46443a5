//! Conversation state: the transcript and the submission state machine.

pub mod controller;
pub mod transcript;

pub use controller::{ConversationState, Submission};
pub use transcript::{Message, Role, Transcript};
