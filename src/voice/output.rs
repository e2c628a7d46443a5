//! Voice output: at-most-one-utterance speech playback.

use crate::capability::speech::{PlaybackEvent, SpeechSynthesis, UtteranceRequest, VoiceProfile};
use crate::config::VoiceOutputConfig;
use crate::error::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Slider range for rate and pitch in the settings panel.
const SETTING_MIN: f32 = 0.5;
const SETTING_MAX: f32 = 2.0;

fn clamp_setting(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(SETTING_MIN, SETTING_MAX)
}

/// Speaks assistant text aloud with user-tunable voice parameters.
///
/// Starting a new utterance always cancels the in-flight one first, so at
/// most one utterance is ever audible; the most recent
/// [`speak`](Self::speak) wins and nothing is queued. Playback events for
/// a cancelled utterance id are stale and ignored, which is what makes the
/// cancel-then-start sequence race-free.
pub struct VoiceOutputAdapter {
    engine: Box<dyn SpeechSynthesis>,
    events_tx: mpsc::UnboundedSender<PlaybackEvent>,
    speaking: bool,
    active_utterance: Option<u64>,
    next_utterance: u64,
    profile: Option<VoiceProfile>,
    profile_pinned: bool,
    rate: f32,
    pitch: f32,
    female_hints: Vec<String>,
}

impl VoiceOutputAdapter {
    /// Create an adapter over `engine`; playback events are published to
    /// `events_tx` and must be fed back via [`handle_event`](Self::handle_event).
    pub fn new(
        engine: Box<dyn SpeechSynthesis>,
        events_tx: mpsc::UnboundedSender<PlaybackEvent>,
        config: &VoiceOutputConfig,
    ) -> Self {
        Self {
            engine,
            events_tx,
            speaking: false,
            active_utterance: None,
            next_utterance: 1,
            profile: None,
            profile_pinned: false,
            rate: clamp_setting(config.rate),
            pitch: clamp_setting(config.pitch),
            female_hints: config.female_voice_hints.clone(),
        }
    }

    /// Whether an utterance is audibly playing.
    pub fn speaking(&self) -> bool {
        self.speaking
    }

    /// Currently selected voice profile.
    pub fn profile(&self) -> Option<&VoiceProfile> {
        self.profile.as_ref()
    }

    /// Current playback rate.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Current playback pitch.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Speak `text`, replacing any in-flight utterance.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine rejects the utterance; the adapter
    /// is left idle and later [`speak`](Self::speak) calls work normally.
    pub fn speak(&mut self, text: &str) -> Result<()> {
        // Cancel first, unconditionally: the engine may or may not emit an
        // end event for the cancelled utterance, and either way its id is
        // no longer active so stale events are dropped.
        self.engine.cancel();
        self.speaking = false;

        let id = self.next_utterance;
        self.next_utterance += 1;

        let request = UtteranceRequest {
            id,
            text: text.to_owned(),
            profile: self.profile.clone(),
            rate: self.rate,
            pitch: self.pitch,
        };
        match self.engine.speak(request, self.events_tx.clone()) {
            Ok(()) => {
                self.active_utterance = Some(id);
                Ok(())
            }
            Err(e) => {
                self.active_utterance = None;
                Err(e)
            }
        }
    }

    /// Cancel the active utterance, if any. Safe when idle.
    ///
    /// The speaking flag is forced down here instead of waiting for an end
    /// event — hosts do not reliably fire one after a cancel.
    pub fn stop(&mut self) {
        self.engine.cancel();
        self.speaking = false;
        self.active_utterance = None;
    }

    /// Fold one engine playback event into the state machine.
    ///
    /// Events carrying a non-active utterance id belong to a cancelled
    /// utterance and are ignored.
    pub fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Started(id) if self.active_utterance == Some(id) => {
                self.speaking = true;
            }
            PlaybackEvent::Ended(id) if self.active_utterance == Some(id) => {
                self.speaking = false;
                self.active_utterance = None;
            }
            PlaybackEvent::Error(id, message) if self.active_utterance == Some(id) => {
                warn!("speech playback failed: {message}");
                self.speaking = false;
                self.active_utterance = None;
            }
            other => {
                debug!("ignoring stale playback event: {other:?}");
            }
        }
    }

    /// Re-resolve the default voice after a catalog change.
    ///
    /// Called once per change. A profile the user picked explicitly is
    /// never replaced.
    pub fn refresh_catalog(&mut self, voices: &[VoiceProfile]) {
        if self.profile_pinned {
            return;
        }
        self.profile = select_default_profile(voices, &self.female_hints);
        if let Some(ref profile) = self.profile {
            debug!(voice = profile.name.as_str(), "auto-selected voice profile");
        }
    }

    /// Pin an explicit user voice selection.
    pub fn select_profile(&mut self, profile: VoiceProfile) {
        self.profile = Some(profile);
        self.profile_pinned = true;
    }

    /// Set the playback rate, clamped to the settings-panel range.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = clamp_setting(rate);
    }

    /// Set the playback pitch, clamped to the settings-panel range.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp_setting(pitch);
    }
}

/// Default voice choice: a female-sounding name first, then the first
/// English voice, then whatever the catalog lists first.
fn select_default_profile(
    voices: &[VoiceProfile],
    female_hints: &[String],
) -> Option<VoiceProfile> {
    let by_hint = voices.iter().find(|v| {
        let name = v.name.to_lowercase();
        female_hints.iter().any(|hint| name.contains(hint.as_str()))
    });
    by_hint
        .or_else(|| voices.iter().find(|v| v.language_tag.starts_with("en")))
        .or_else(|| voices.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::AssistantError;
    use std::sync::{Arc, Mutex};
    use tokio::sync::watch;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Cancel,
        Speak(u64, String),
    }

    struct FakeSynthesis {
        ops: Arc<Mutex<Vec<Op>>>,
        voices: watch::Sender<Vec<VoiceProfile>>,
        fail_next: bool,
    }

    impl FakeSynthesis {
        fn new() -> (Self, Arc<Mutex<Vec<Op>>>) {
            let ops = Arc::new(Mutex::new(Vec::new()));
            let (voices, _) = watch::channel(Vec::new());
            (
                Self {
                    ops: Arc::clone(&ops),
                    voices,
                    fail_next: false,
                },
                ops,
            )
        }
    }

    impl SpeechSynthesis for FakeSynthesis {
        fn speak(
            &mut self,
            request: UtteranceRequest,
            _events: mpsc::UnboundedSender<PlaybackEvent>,
        ) -> Result<()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(AssistantError::Playback("engine busy".to_owned()));
            }
            self.ops
                .lock()
                .unwrap()
                .push(Op::Speak(request.id, request.text));
            Ok(())
        }

        fn cancel(&mut self) {
            self.ops.lock().unwrap().push(Op::Cancel);
        }

        fn voices(&self) -> watch::Receiver<Vec<VoiceProfile>> {
            self.voices.subscribe()
        }
    }

    fn adapter() -> (VoiceOutputAdapter, Arc<Mutex<Vec<Op>>>) {
        let (engine, ops) = FakeSynthesis::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        (
            VoiceOutputAdapter::new(Box::new(engine), tx, &VoiceOutputConfig::default()),
            ops,
        )
    }

    fn voice(name: &str, lang: &str) -> VoiceProfile {
        VoiceProfile {
            name: name.to_owned(),
            language_tag: lang.to_owned(),
        }
    }

    #[test]
    fn speak_cancels_before_starting() {
        let (mut out, ops) = adapter();
        out.speak("first").unwrap();
        out.speak("second").unwrap();

        let ops = ops.lock().unwrap();
        assert_eq!(
            *ops,
            vec![
                Op::Cancel,
                Op::Speak(1, "first".to_owned()),
                Op::Cancel,
                Op::Speak(2, "second".to_owned()),
            ]
        );
    }

    #[test]
    fn only_the_newest_utterance_drives_the_speaking_flag() {
        let (mut out, _) = adapter();
        out.speak("first").unwrap();
        out.speak("second").unwrap();

        // Events from the cancelled first utterance are stale.
        out.handle_event(PlaybackEvent::Started(1));
        assert!(!out.speaking());
        out.handle_event(PlaybackEvent::Ended(1));
        assert!(!out.speaking());

        out.handle_event(PlaybackEvent::Started(2));
        assert!(out.speaking());
        out.handle_event(PlaybackEvent::Ended(2));
        assert!(!out.speaking());
    }

    #[test]
    fn stop_forces_the_flag_down_and_is_idempotent() {
        let (mut out, ops) = adapter();
        out.speak("say this").unwrap();
        out.handle_event(PlaybackEvent::Started(1));
        assert!(out.speaking());

        out.stop();
        assert!(!out.speaking());
        // A late end event from the host changes nothing.
        out.handle_event(PlaybackEvent::Ended(1));
        assert!(!out.speaking());

        out.stop();
        assert!(!out.speaking());
        assert!(ops.lock().unwrap().contains(&Op::Cancel));
    }

    #[test]
    fn playback_error_drops_the_flag() {
        let (mut out, _) = adapter();
        out.speak("text").unwrap();
        out.handle_event(PlaybackEvent::Started(1));
        out.handle_event(PlaybackEvent::Error(1, "synthesis-failed".to_owned()));
        assert!(!out.speaking());
    }

    #[test]
    fn engine_rejection_leaves_adapter_idle() {
        let (mut engine, _) = FakeSynthesis::new();
        engine.fail_next = true;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut out = VoiceOutputAdapter::new(Box::new(engine), tx, &VoiceOutputConfig::default());

        assert!(out.speak("will fail").is_err());
        assert!(!out.speaking());
        // Recovery: the next call is a fresh utterance.
        out.speak("works now").unwrap();
        out.handle_event(PlaybackEvent::Started(2));
        assert!(out.speaking());
    }

    #[test]
    fn default_profile_prefers_female_hint_then_english_then_any() {
        let hints = VoiceOutputConfig::default().female_voice_hints;

        let catalog = vec![
            voice("Daniel", "en-GB"),
            voice("Microsoft Zira", "en-US"),
            voice("Thomas", "fr-FR"),
        ];
        let chosen = select_default_profile(&catalog, &hints).unwrap();
        assert_eq!(chosen.name, "Microsoft Zira");

        let catalog = vec![voice("Thomas", "fr-FR"), voice("Daniel", "en-GB")];
        let chosen = select_default_profile(&catalog, &hints).unwrap();
        assert_eq!(chosen.name, "Daniel");

        let catalog = vec![voice("Thomas", "fr-FR")];
        let chosen = select_default_profile(&catalog, &hints).unwrap();
        assert_eq!(chosen.name, "Thomas");

        assert!(select_default_profile(&[], &hints).is_none());
    }

    #[test]
    fn catalog_refresh_never_disturbs_a_pinned_profile() {
        let (mut out, _) = adapter();
        out.refresh_catalog(&[voice("Daniel", "en-GB")]);
        assert_eq!(out.profile().unwrap().name, "Daniel");

        out.select_profile(voice("Thomas", "fr-FR"));
        out.refresh_catalog(&[voice("Samantha", "en-US"), voice("Daniel", "en-GB")]);
        assert_eq!(out.profile().unwrap().name, "Thomas");
    }

    #[test]
    fn rate_and_pitch_are_clamped_to_the_slider_range() {
        let (mut out, _) = adapter();
        out.set_rate(5.0);
        assert!((out.rate() - 2.0).abs() < f32::EPSILON);
        out.set_rate(0.1);
        assert!((out.rate() - 0.5).abs() < f32::EPSILON);
        out.set_pitch(f32::NAN);
        assert!((out.pitch() - 1.0).abs() < f32::EPSILON);
    }
}
