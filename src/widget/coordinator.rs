//! Widget coordinator: one event loop per assistant widget instance.
//!
//! All mutable state lives inside the spawned task; hosts talk to it
//! through [`WidgetHandle`]. The loop multiplexes host commands, speech
//! capture/playback events, query outcomes and voice-catalog changes on a
//! single `tokio::select!`, so the three sub-machines interleave without
//! shared-memory races: a user can stop listening while an utterance is
//! still speaking, and submit new text while a previous answer plays.

use crate::capability::query::{HistoryService, QueryRequest, QueryResponse, QueryService};
use crate::capability::speech::{
    CaptureEvent, NullCapture, NullSynthesis, PlaybackEvent, SpeechCapture, SpeechSynthesis,
    VoiceProfile,
};
use crate::config::AssistantConfig;
use crate::context::ConversationScope;
use crate::conversation::controller::ConversationState;
use crate::conversation::transcript::{Message, Role};
use crate::error::{AssistantError, Result};
use crate::runtime::WidgetEvent;
use crate::voice::{VoiceInputAdapter, VoiceOutputAdapter};
use crate::widget::surface::SurfaceState;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Broadcast buffer for widget events.
const EVENT_CHANNEL_SIZE: usize = 64;

/// Commands a host UI sends to a running widget.
pub enum WidgetCommand {
    /// Open the widget window.
    Open,
    /// Close the widget window.
    Close,
    /// Collapse or expand the open window.
    ToggleMinimized,
    /// Show or hide the voice settings panel.
    ToggleSettings,
    /// Overwrite the input buffer (typing).
    SetInput(String),
    /// Copy the quick prompt at this index into the input buffer.
    UseQuickPrompt(usize),
    /// Submit the current input buffer.
    Submit,
    /// Reset the conversation to a fresh greeting.
    Clear,
    /// Begin voice capture into the input buffer.
    StartListening,
    /// End voice capture.
    StopListening,
    /// Speak the assistant message with this id aloud.
    SpeakMessage(u64),
    /// Stop speech playback.
    StopSpeaking,
    /// Toggle automatic speaking of assistant answers.
    SetVoiceEnabled(bool),
    /// Pin an explicit voice selection.
    SelectVoice(VoiceProfile),
    /// Set the playback rate (clamped).
    SetRate(f32),
    /// Set the playback pitch (clamped).
    SetPitch(f32),
    /// Reply with a point-in-time view of the widget state.
    Snapshot(oneshot::Sender<WidgetSnapshot>),
}

/// Point-in-time view of a widget's state.
#[derive(Debug, Clone)]
pub struct WidgetSnapshot {
    /// Chrome flags.
    pub surface: SurfaceState,
    /// Transcript in display order.
    pub transcript: Vec<Message>,
    /// Whether a submission is awaiting its response.
    pub pending: bool,
    /// Input buffer contents.
    pub input_buffer: String,
    /// Whether voice capture is active.
    pub listening: bool,
    /// Whether speech playback is audible.
    pub speaking: bool,
    /// Selected voice profile, if any.
    pub voice_profile: Option<VoiceProfile>,
    /// Playback rate.
    pub rate: f32,
    /// Playback pitch.
    pub pitch: f32,
}

/// Outcome of one remote query, delivered back to the loop.
struct QueryOutcome {
    submission: u64,
    result: Result<QueryResponse>,
}

/// Builder for one widget instance.
///
/// Voice capabilities default to the null implementations, so a headless
/// host only has to provide the query service.
pub struct AssistantWidget {
    config: AssistantConfig,
    scope: ConversationScope,
    query: Arc<dyn QueryService>,
    history: Option<Arc<dyn HistoryService>>,
    capture: Box<dyn SpeechCapture>,
    synthesis: Box<dyn SpeechSynthesis>,
    cancel: CancellationToken,
}

impl AssistantWidget {
    /// Create a widget builder for `scope` backed by `query`.
    pub fn new(config: AssistantConfig, scope: ConversationScope, query: Arc<dyn QueryService>) -> Self {
        Self {
            config,
            scope,
            query,
            history: None,
            capture: Box::new(NullCapture),
            synthesis: Box::new(NullSynthesis::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a conversation-history service.
    ///
    /// Plan-scoped widgets fire a best-effort server-side delete on
    /// [`WidgetCommand::Clear`] when one is attached.
    pub fn with_history(mut self, history: Arc<dyn HistoryService>) -> Self {
        self.history = Some(history);
        self
    }

    /// Attach a speech-capture capability.
    pub fn with_capture(mut self, capture: Box<dyn SpeechCapture>) -> Self {
        self.capture = capture;
        self
    }

    /// Attach a speech-synthesis capability.
    pub fn with_synthesis(mut self, synthesis: Box<dyn SpeechSynthesis>) -> Self {
        self.synthesis = synthesis;
        self
    }

    /// Get a clone of the cancellation token for external shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the widget event loop and return the host-side handle.
    pub fn spawn(self) -> WidgetHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let handle = WidgetHandle {
            commands: command_tx,
            events: event_tx.clone(),
            cancel: self.cancel.clone(),
        };
        tokio::spawn(run_widget_loop(self, command_rx, event_tx));
        handle
    }
}

/// Host-side handle to a running widget.
#[derive(Clone)]
pub struct WidgetHandle {
    commands: mpsc::UnboundedSender<WidgetCommand>,
    events: broadcast::Sender<WidgetEvent>,
    cancel: CancellationToken,
}

impl WidgetHandle {
    /// Send a command to the widget loop.
    ///
    /// Returns `false` when the loop has already shut down.
    pub fn send(&self, command: WidgetCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Subscribe to widget events.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    /// Fetch a point-in-time view of the widget state.
    ///
    /// # Errors
    ///
    /// Returns a channel error when the widget loop has shut down.
    pub async fn snapshot(&self) -> Result<WidgetSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(WidgetCommand::Snapshot(reply_tx))
            .map_err(|_| AssistantError::Channel("widget loop is gone".to_owned()))?;
        reply_rx
            .await
            .map_err(|_| AssistantError::Channel("widget loop dropped the snapshot".to_owned()))
    }

    /// Request graceful shutdown of the widget loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Everything the loop mutates, kept off the select! for readable arms.
struct WidgetLoop {
    scope: ConversationScope,
    user_id: i64,
    quick_prompts: Vec<String>,
    surface: SurfaceState,
    conversation: ConversationState,
    voice_in: VoiceInputAdapter,
    voice_out: VoiceOutputAdapter,
    query: Arc<dyn QueryService>,
    history: Option<Arc<dyn HistoryService>>,
    outcome_tx: mpsc::UnboundedSender<QueryOutcome>,
    events: broadcast::Sender<WidgetEvent>,
}

async fn run_widget_loop(
    widget: AssistantWidget,
    mut command_rx: mpsc::UnboundedReceiver<WidgetCommand>,
    events: broadcast::Sender<WidgetEvent>,
) {
    let AssistantWidget {
        config,
        scope,
        query,
        history,
        capture,
        synthesis,
        cancel,
    } = widget;

    let (capture_tx, mut capture_rx) = mpsc::unbounded_channel();
    let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let mut voices_rx = synthesis.voices();
    // When the engine drops its catalog sender, stop polling the watch
    // channel instead of spinning on its error.
    let mut voices_open = true;

    let quick_prompts = config.conversation.quick_prompts.clone();
    let mut state = WidgetLoop {
        scope,
        user_id: config.conversation.user_id,
        quick_prompts,
        surface: SurfaceState {
            voice_enabled: config.voice_output.auto_speak,
            ..SurfaceState::default()
        },
        voice_in: VoiceInputAdapter::new(capture, capture_tx, &config.voice_input),
        voice_out: VoiceOutputAdapter::new(synthesis, playback_tx, &config.voice_output),
        conversation: ConversationState::new(config.conversation),
        query,
        history,
        outcome_tx,
        events,
    };

    // The catalog may already be populated when the widget mounts.
    let initial_voices = voices_rx.borrow_and_update().clone();
    if !initial_voices.is_empty() {
        state.refresh_voices(&initial_voices);
    }

    info!(plan_id = ?state.scope.plan_id(), "assistant widget started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            command = command_rx.recv() => {
                match command {
                    Some(command) => state.handle_command(command),
                    // Every handle dropped: nobody can talk to us again.
                    None => break,
                }
            }
            Some(event) = capture_rx.recv() => state.handle_capture_event(event),
            Some(event) = playback_rx.recv() => state.handle_playback_event(event),
            Some(outcome) = outcome_rx.recv() => state.handle_outcome(outcome),
            changed = voices_rx.changed(), if voices_open => {
                match changed {
                    Ok(()) => {
                        let voices = voices_rx.borrow_and_update().clone();
                        state.refresh_voices(&voices);
                    }
                    Err(_) => voices_open = false,
                }
            }
        }
    }

    info!("assistant widget stopped");
}

impl WidgetLoop {
    fn emit(&self, event: WidgetEvent) {
        // No subscribers is fine; the snapshot command covers polling UIs.
        let _ = self.events.send(event);
    }

    fn emit_surface(&self) {
        self.emit(WidgetEvent::Surface(self.surface));
    }

    fn handle_command(&mut self, command: WidgetCommand) {
        match command {
            WidgetCommand::Open => {
                self.surface.open();
                self.emit_surface();
            }
            WidgetCommand::Close => {
                self.surface.close();
                self.emit_surface();
            }
            WidgetCommand::ToggleMinimized => {
                self.surface.toggle_minimized();
                self.emit_surface();
            }
            WidgetCommand::ToggleSettings => {
                self.surface.toggle_settings();
                self.emit_surface();
            }
            WidgetCommand::SetInput(text) => {
                self.conversation.set_input_buffer(text.clone());
                self.emit(WidgetEvent::InputChanged(text));
            }
            WidgetCommand::UseQuickPrompt(index) => {
                if let Some(prompt) = self.quick_prompts.get(index).cloned() {
                    self.conversation.set_input_buffer(prompt.clone());
                    self.emit(WidgetEvent::InputChanged(prompt));
                } else {
                    debug!(index, "quick prompt index out of range");
                }
            }
            WidgetCommand::Submit => self.submit_input(),
            WidgetCommand::Clear => self.clear_conversation(),
            WidgetCommand::StartListening => match self.voice_in.start() {
                Ok(()) => self.emit(WidgetEvent::Listening { active: true }),
                Err(e) => {
                    warn!("voice input unavailable: {e}");
                    self.emit(WidgetEvent::Notice(e.to_string()));
                }
            },
            WidgetCommand::StopListening => {
                let was_listening = self.voice_in.listening();
                self.voice_in.stop();
                if was_listening {
                    self.emit(WidgetEvent::Listening { active: false });
                }
            }
            WidgetCommand::SpeakMessage(id) => {
                // Only assistant messages carry a speaker button.
                let text = self
                    .conversation
                    .message(id)
                    .filter(|m| m.role == Role::Assistant)
                    .map(|m| m.text.clone());
                match text {
                    Some(text) => self.speak_text(&text),
                    None => debug!(id, "no assistant message with this id to speak"),
                }
            }
            WidgetCommand::StopSpeaking => {
                let was_speaking = self.voice_out.speaking();
                self.voice_out.stop();
                if was_speaking {
                    self.emit(WidgetEvent::Speaking { active: false });
                }
            }
            WidgetCommand::SetVoiceEnabled(enabled) => {
                self.surface.voice_enabled = enabled;
                self.emit_surface();
            }
            WidgetCommand::SelectVoice(profile) => {
                self.voice_out.select_profile(profile);
                self.emit(WidgetEvent::VoiceProfile(self.voice_out.profile().cloned()));
            }
            WidgetCommand::SetRate(rate) => self.voice_out.set_rate(rate),
            WidgetCommand::SetPitch(pitch) => self.voice_out.set_pitch(pitch),
            WidgetCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Accept the current input buffer as a submission and start the
    /// remote query. A rejection (empty input, request in flight) changes
    /// nothing — the controller is the backstop even when the UI forgot
    /// to disable its send button.
    fn submit_input(&mut self) {
        let text = self.conversation.input_buffer().to_owned();
        let Some((message, submission)) = self.conversation.submit(&text) else {
            debug!("submission rejected (empty input or request in flight)");
            return;
        };

        self.emit(WidgetEvent::MessageAppended(message));
        self.emit(WidgetEvent::InputChanged(String::new()));
        self.emit(WidgetEvent::Pending { active: true });

        let request = QueryRequest::new(submission.text, self.user_id, &self.scope);
        info!(
            submission = submission.id,
            request_id = %request.request_id,
            "submission accepted"
        );
        let query = Arc::clone(&self.query);
        let outcome_tx = self.outcome_tx.clone();
        let submission_id = submission.id;
        tokio::spawn(async move {
            let result = query.query(&request).await;
            let _ = outcome_tx.send(QueryOutcome {
                submission: submission_id,
                result,
            });
        });
    }

    /// Reset the transcript; an in-flight submission keeps running and its
    /// answer lands after the fresh greeting.
    fn clear_conversation(&mut self) {
        let greeting = self.conversation.clear();
        self.emit(WidgetEvent::TranscriptCleared);
        self.emit(WidgetEvent::MessageAppended(greeting));

        // Best-effort server-side delete for plan-scoped conversations.
        if let (Some(history), Some(plan_id)) = (self.history.clone(), self.scope.plan_id()) {
            let user_id = self.user_id;
            tokio::spawn(async move {
                if let Err(e) = history.clear(user_id, plan_id).await {
                    warn!("failed to clear server-side history: {e}");
                }
            });
        }
    }

    fn handle_outcome(&mut self, outcome: QueryOutcome) {
        let (message, spoken) = match outcome.result {
            Ok(response) => {
                let message = self.conversation.resolve_success(response);
                (message, self.surface.voice_enabled)
            }
            Err(e) => {
                warn!(submission = outcome.submission, "assistant query failed: {e}");
                (self.conversation.resolve_failure(), false)
            }
        };
        self.emit(WidgetEvent::Pending { active: false });
        self.emit(WidgetEvent::MessageAppended(message.clone()));
        if spoken {
            self.speak_text(&message.text);
        }
    }

    fn handle_capture_event(&mut self, event: CaptureEvent) {
        let was_listening = self.voice_in.listening();
        if let Some(text) = self.voice_in.handle_event(event) {
            self.conversation.set_input_buffer(text.clone());
            self.emit(WidgetEvent::InputChanged(text));
        }
        if self.voice_in.listening() != was_listening {
            self.emit(WidgetEvent::Listening {
                active: self.voice_in.listening(),
            });
        }
    }

    fn handle_playback_event(&mut self, event: PlaybackEvent) {
        let was_speaking = self.voice_out.speaking();
        self.voice_out.handle_event(event);
        if self.voice_out.speaking() != was_speaking {
            self.emit(WidgetEvent::Speaking {
                active: self.voice_out.speaking(),
            });
        }
    }

    fn refresh_voices(&mut self, voices: &[VoiceProfile]) {
        let before = self.voice_out.profile().cloned();
        self.voice_out.refresh_catalog(voices);
        let after = self.voice_out.profile().cloned();
        if before != after {
            self.emit(WidgetEvent::VoiceProfile(after));
        }
    }

    /// Start speaking `text`; a playback failure is a silent no-op beyond
    /// the log line — it never blocks text interaction.
    fn speak_text(&mut self, text: &str) {
        let was_speaking = self.voice_out.speaking();
        if let Err(e) = self.voice_out.speak(text) {
            warn!("cannot start speech playback: {e}");
        }
        if self.voice_out.speaking() != was_speaking {
            self.emit(WidgetEvent::Speaking {
                active: self.voice_out.speaking(),
            });
        }
    }

    fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            surface: self.surface,
            transcript: self.conversation.transcript().to_vec(),
            pending: self.conversation.pending(),
            input_buffer: self.conversation.input_buffer().to_owned(),
            listening: self.voice_in.listening(),
            speaking: self.voice_out.speaking(),
            voice_profile: self.voice_out.profile().cloned(),
            rate: self.voice_out.rate(),
            pitch: self.voice_out.pitch(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::context::PageContext;
    use async_trait::async_trait;

    struct EchoQuery;

    #[async_trait]
    impl QueryService for EchoQuery {
        async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
            Ok(QueryResponse {
                answer_text: format!("echo: {}", request.text),
                provider_tag: Some("echo".to_owned()),
            })
        }
    }

    fn widget() -> WidgetHandle {
        AssistantWidget::new(
            AssistantConfig::default(),
            ConversationScope::Global {
                page: PageContext::Other,
            },
            Arc::new(EchoQuery),
        )
        .spawn()
    }

    #[tokio::test]
    async fn snapshot_shows_seeded_greeting() {
        let handle = widget();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.transcript[0].role, Role::Assistant);
        assert!(!snapshot.pending);
        assert!(!snapshot.surface.open);
        handle.shutdown();
    }

    #[tokio::test]
    async fn surface_commands_flip_flags() {
        let handle = widget();
        handle.send(WidgetCommand::Open);
        handle.send(WidgetCommand::ToggleMinimized);
        handle.send(WidgetCommand::SetVoiceEnabled(true));

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.surface.open);
        assert!(snapshot.surface.minimized);
        assert!(snapshot.surface.voice_enabled);
        handle.shutdown();
    }

    #[tokio::test]
    async fn quick_prompt_fills_input_buffer() {
        let handle = widget();
        handle.send(WidgetCommand::UseQuickPrompt(1));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.input_buffer, "Give me an example");

        // Out-of-range index leaves the buffer alone.
        handle.send(WidgetCommand::UseQuickPrompt(99));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.input_buffer, "Give me an example");
        handle.shutdown();
    }

    #[tokio::test]
    async fn start_listening_without_capture_emits_notice() {
        let handle = widget();
        let mut events = handle.subscribe();
        handle.send(WidgetCommand::StartListening);

        loop {
            match events.recv().await.unwrap() {
                WidgetEvent::Notice(text) => {
                    assert!(text.contains("capability unavailable"));
                    break;
                }
                _ => continue,
            }
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.listening);
        handle.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let handle = widget();
        handle.shutdown();
        // The loop exits; snapshot eventually fails once the command
        // channel is dropped. Allow either outcome of the race.
        let _ = handle.snapshot().await;
    }
}
