//! Voice input: the capture-transcript-then-stop lifecycle.

use crate::capability::speech::{CaptureEvent, SpeechCapture};
use crate::config::VoiceInputConfig;
use crate::error::{AssistantError, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Bridges one-shot speech capture to the conversation input buffer.
///
/// `listening` is true only between a successful [`start`](Self::start)
/// and the first of: an explicit [`stop`](Self::stop), a recognized final
/// transcript, or an engine end/error event.
pub struct VoiceInputAdapter {
    engine: Box<dyn SpeechCapture>,
    events_tx: mpsc::UnboundedSender<CaptureEvent>,
    language: String,
    listening: bool,
    last_transcript: String,
}

impl VoiceInputAdapter {
    /// Create an adapter over `engine`; session events are published to
    /// `events_tx` and must be fed back via [`handle_event`](Self::handle_event).
    pub fn new(
        engine: Box<dyn SpeechCapture>,
        events_tx: mpsc::UnboundedSender<CaptureEvent>,
        config: &VoiceInputConfig,
    ) -> Self {
        Self {
            engine,
            events_tx,
            language: config.language.clone(),
            listening: false,
            last_transcript: String::new(),
        }
    }

    /// Whether a capture session is active.
    pub fn listening(&self) -> bool {
        self.listening
    }

    /// The most recently recognized transcript.
    pub fn last_transcript(&self) -> &str {
        &self.last_transcript
    }

    /// Begin a single-utterance capture session.
    ///
    /// Already listening is a no-op (the UI disables the button, the
    /// adapter enforces it anyway).
    ///
    /// # Errors
    ///
    /// [`AssistantError::CapabilityUnavailable`] when the host has no
    /// speech recognition; the caller surfaces this as a user-visible
    /// notice, never a crash.
    pub fn start(&mut self) -> Result<()> {
        if self.listening {
            return Ok(());
        }
        if !self.engine.is_available() {
            return Err(AssistantError::CapabilityUnavailable(
                "speech recognition is not supported on this host".to_owned(),
            ));
        }
        self.engine.start(&self.language, self.events_tx.clone())?;
        self.listening = true;
        Ok(())
    }

    /// Forcibly end capture. No-op when idle.
    pub fn stop(&mut self) {
        if self.listening {
            self.engine.cancel();
            self.listening = false;
        }
    }

    /// Fold one engine event into the state machine.
    ///
    /// Returns the recognized transcript when one arrived. End and error
    /// events only drop the listening flag — both look the same to the
    /// conversation, and retrying is a fresh [`start`](Self::start).
    pub fn handle_event(&mut self, event: CaptureEvent) -> Option<String> {
        match event {
            CaptureEvent::Started => {
                self.listening = true;
                None
            }
            CaptureEvent::Finished(text) => {
                debug!("speech capture recognized: \"{text}\"");
                self.listening = false;
                self.last_transcript = text.clone();
                Some(text)
            }
            CaptureEvent::Ended => {
                self.listening = false;
                None
            }
            CaptureEvent::Error(message) => {
                warn!("speech capture failed: {message}");
                self.listening = false;
                None
            }
        }
    }
}
