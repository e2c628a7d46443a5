//! Configuration types for the assistant widget.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for one assistant widget instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Conversation seeding, fallback texts and identity.
    pub conversation: ConversationConfig,
    /// Voice input (speech capture) settings.
    pub voice_input: VoiceInputConfig,
    /// Voice output (speech synthesis) settings.
    pub voice_output: VoiceOutputConfig,
    /// Remote query service settings.
    pub query: QueryConfig,
}

/// Conversation texts and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Greeting message seeded into a fresh conversation.
    pub greeting: String,
    /// Greeting message seeded after the user clears the conversation.
    pub cleared_greeting: String,
    /// Assistant message appended when the query service fails.
    pub fallback_reply: String,
    /// Assistant message used when the backend answers with empty text.
    pub rephrase_reply: String,
    /// Acting user id sent with every query.
    pub user_id: i64,
    /// Quick prompt chips shown next to the input field.
    pub quick_prompts: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! I'm your AI study assistant. Ask me anything about your study materials! 📚".to_owned(),
            cleared_greeting: "Conversation cleared. How can I help you?".to_owned(),
            fallback_reply: "Sorry, I encountered an error. Please try again.".to_owned(),
            rephrase_reply: "I'm having trouble understanding. Could you rephrase that?"
                .to_owned(),
            user_id: 1,
            quick_prompts: vec![
                "Explain this topic".to_owned(),
                "Give me an example".to_owned(),
                "Common mistakes?".to_owned(),
                "Quiz me".to_owned(),
            ],
        }
    }
}

/// Speech capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceInputConfig {
    /// BCP-47 language tag requested from the capture capability.
    pub language: String,
}

impl Default for VoiceInputConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
        }
    }
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceOutputConfig {
    /// Playback rate. Clamped to \[0.5, 2.0\] at the adapter.
    pub rate: f32,
    /// Playback pitch. Clamped to \[0.5, 2.0\] at the adapter.
    pub pitch: f32,
    /// Whether assistant answers are spoken aloud automatically.
    pub auto_speak: bool,
    /// Lowercase name fragments that mark a voice as female-sounding,
    /// used for the default profile choice.
    pub female_voice_hints: Vec<String>,
}

impl Default for VoiceOutputConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            auto_speak: false,
            female_voice_hints: vec![
                "female".to_owned(),
                "zira".to_owned(),
                "samantha".to_owned(),
                "victoria".to_owned(),
            ],
        }
    }
}

/// Remote query service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Base URL of the study-app backend.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            timeout_secs: 30,
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file location under the platform config directory.
    ///
    /// Returns `None` when the platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sage").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AssistantConfig::default();
        assert!(config.conversation.greeting.contains("study assistant"));
        assert_eq!(config.conversation.user_id, 1);
        assert_eq!(config.voice_input.language, "en-US");
        assert!((config.voice_output.rate - 1.0).abs() < f32::EPSILON);
        assert!(!config.voice_output.auto_speak);
        assert_eq!(config.query.base_url, "http://localhost:8000");
        assert_eq!(config.query.timeout_secs, 30);
        assert_eq!(config.conversation.quick_prompts.len(), 4);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AssistantConfig::default();
        config.conversation.user_id = 7;
        config.voice_output.auto_speak = true;
        config.query.base_url = "http://backend.test:9000".to_owned();

        config.save_to_file(&path).unwrap();
        let loaded = AssistantConfig::from_file(&path).unwrap();

        assert_eq!(loaded.conversation.user_id, 7);
        assert!(loaded.voice_output.auto_speak);
        assert_eq!(loaded.query.base_url, "http://backend.test:9000");
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = AssistantConfig::from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not toml").unwrap();
        assert!(AssistantConfig::from_file(&path).is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AssistantConfig = toml::from_str(
            r#"
            [query]
            base_url = "http://other:1234"
            "#,
        )
        .unwrap();
        assert_eq!(config.query.base_url, "http://other:1234");
        assert_eq!(config.query.timeout_secs, 30);
        assert_eq!(config.voice_input.language, "en-US");
    }
}
