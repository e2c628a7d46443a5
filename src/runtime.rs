//! Events the widget publishes for host UIs.
//!
//! Intentionally lightweight (no heavy payloads) so the coordinator can
//! emit without blocking its event loop; a slow subscriber only lags its
//! own broadcast receiver.

use crate::capability::speech::VoiceProfile;
use crate::conversation::transcript::Message;
use crate::widget::surface::SurfaceState;

/// What the widget is doing "right now".
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    /// A message was appended to the transcript.
    MessageAppended(Message),
    /// The transcript was reset; a fresh greeting follows as
    /// [`WidgetEvent::MessageAppended`].
    TranscriptCleared,
    /// A submission went out (`active`) or resolved (`!active`).
    Pending { active: bool },
    /// The input buffer changed (typing, quick prompt, or voice transcript).
    InputChanged(String),
    /// Speech capture toggled.
    Listening { active: bool },
    /// Speech playback toggled.
    Speaking { active: bool },
    /// The selected voice profile changed (auto-selection or user choice).
    VoiceProfile(Option<VoiceProfile>),
    /// A surface flag changed (open/minimized/settings/voice mode).
    Surface(SurfaceState),
    /// User-visible notice, e.g. "speech recognition not supported".
    Notice(String),
}
