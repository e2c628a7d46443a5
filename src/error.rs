//! Error types for the assistant engine.

/// Top-level error type for the assistant engine.
///
/// Nothing here is fatal to a widget: every failure is converted at the
/// adapter/controller boundary into a state change or a single synthetic
/// chat message, and the widget loop keeps running.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// A host speech capability is absent or refused to initialize.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Remote query service unreachable or returned a server error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Speech capture failed to produce a usable transcript.
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech synthesis failed to start or complete an utterance.
    #[error("playback error: {0}")]
    Playback(String),

    /// Conversation-history persistence error.
    #[error("history error: {0}")]
    History(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
