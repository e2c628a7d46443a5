//! Speech capability ports: capture (speech-to-text) and synthesis
//! (text-to-speech).
//!
//! Both capabilities are callback-driven on real hosts, so the ports
//! report progress through channels: the caller hands a sender to
//! [`SpeechCapture::start`] / [`SpeechSynthesis::speak`] and folds the
//! events into its own state machine. At most one capture session and one
//! utterance are active per engine; `cancel` must be a safe no-op when
//! idle.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

/// Events reported by a speech-capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Capture actually began (microphone open).
    Started,
    /// A final transcript was recognized; the session is over.
    Finished(String),
    /// The session ended without a usable transcript.
    Ended,
    /// The session failed (no speech, permission denied, aborted).
    ///
    /// The message is for logging only — the widget treats this exactly
    /// like [`CaptureEvent::Ended`].
    Error(String),
}

/// Events reported during utterance playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The utterance with this id became audible.
    Started(u64),
    /// The utterance with this id finished playing.
    Ended(u64),
    /// Playback of the utterance failed.
    Error(u64, String),
}

/// A synthesis request for one utterance.
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    /// Caller-assigned utterance id, echoed in every playback event.
    pub id: u64,
    /// Text to speak.
    pub text: String,
    /// Voice to use; `None` lets the host pick.
    pub profile: Option<VoiceProfile>,
    /// Playback rate.
    pub rate: f32,
    /// Playback pitch.
    pub pitch: f32,
}

/// One entry of the host voice catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Display name, e.g. "Microsoft Zira".
    pub name: String,
    /// BCP-47 language tag, e.g. "en-US".
    pub language_tag: String,
}

/// One-shot speech-to-text capture.
///
/// `start` begins a single-utterance (non-continuous) session and reports
/// progress on the given channel until a final transcript, an end, or an
/// error — whichever comes first.
pub trait SpeechCapture: Send {
    /// Whether the host provides speech recognition at all.
    fn is_available(&self) -> bool;

    /// Begin a capture session recognizing `language` (BCP-47 tag).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be started.
    fn start(
        &mut self,
        language: &str,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<()>;

    /// Forcibly end the current session, if any.
    fn cancel(&mut self);
}

/// Text-to-speech playback.
pub trait SpeechSynthesis: Send {
    /// Start speaking an utterance; progress arrives on `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the utterance cannot be started.
    fn speak(
        &mut self,
        request: UtteranceRequest,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<()>;

    /// Cancel the current utterance, if any.
    ///
    /// Hosts are not required to emit an end event after cancellation —
    /// callers must force their own speaking flag down.
    fn cancel(&mut self);

    /// The host voice catalog.
    ///
    /// Voices may load lazily and the catalog may change over time; the
    /// receiver observes each change.
    fn voices(&self) -> watch::Receiver<Vec<VoiceProfile>>;
}

/// Capture stand-in for hosts without speech recognition.
pub struct NullCapture;

impl SpeechCapture for NullCapture {
    fn is_available(&self) -> bool {
        false
    }

    fn start(
        &mut self,
        _language: &str,
        _events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Result<()> {
        Err(AssistantError::CapabilityUnavailable(
            "speech recognition is not supported on this host".to_owned(),
        ))
    }

    fn cancel(&mut self) {}
}

/// Synthesis stand-in that completes every utterance immediately and
/// exposes an empty, never-changing catalog.
pub struct NullSynthesis {
    voices: watch::Sender<Vec<VoiceProfile>>,
}

impl NullSynthesis {
    /// Create a silent synthesis engine.
    pub fn new() -> Self {
        let (voices, _) = watch::channel(Vec::new());
        Self { voices }
    }
}

impl Default for NullSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesis for NullSynthesis {
    fn speak(
        &mut self,
        request: UtteranceRequest,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<()> {
        // No audio path: report an immediate start/end pair.
        let _ = events.send(PlaybackEvent::Started(request.id));
        let _ = events.send(PlaybackEvent::Ended(request.id));
        Ok(())
    }

    fn cancel(&mut self) {}

    fn voices(&self) -> watch::Receiver<Vec<VoiceProfile>> {
        self.voices.subscribe()
    }
}
