//! Widget surface flags: the chrome state around the conversation.

use serde::Serialize;

/// Plain open/minimized/settings/voice-mode flags.
///
/// Nothing here gates the conversation logic — a closed widget still
/// resolves an in-flight submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceState {
    /// Whether the widget window is open (vs the floating launcher button).
    pub open: bool,
    /// Whether the open window is collapsed to its header.
    pub minimized: bool,
    /// Whether the voice settings panel is shown.
    pub settings_open: bool,
    /// Whether assistant answers are spoken aloud automatically.
    pub voice_enabled: bool,
}

impl SurfaceState {
    /// Open the widget window.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the widget window (minimized/settings flags persist).
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Collapse or expand the window.
    pub fn toggle_minimized(&mut self) {
        self.minimized = !self.minimized;
    }

    /// Show or hide the voice settings panel.
    pub fn toggle_settings(&mut self) {
        self.settings_open = !self.settings_open;
    }
}
