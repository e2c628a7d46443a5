//! Sage: conversation engine for a voice-enabled AI study assistant.
//!
//! This crate owns the interaction logic of the study app's chatbot
//! widgets — the page-scoped and the site-wide assistant, deduplicated
//! into one reusable core:
//!
//! - **Conversation controller**: append-only transcript with
//!   single-pending submission gating and an input buffer
//! - **Voice input adapter**: start/stop lifecycle over a host
//!   speech-capture capability, feeding recognized text into the buffer
//! - **Voice output adapter**: at-most-one-utterance speech playback with
//!   user-tunable voice, rate and pitch
//! - **Widget coordinator**: one event loop per widget instance, wiring
//!   the three sub-machines to host commands and capability events
//!
//! # Architecture
//!
//! Host capabilities (speech capture, speech synthesis, the remote query
//! and history services) are injected through the traits in
//! [`capability`], so the core runs against fakes in tests and several
//! widget instances never fight over one shared host engine. Everything
//! else is channels: commands in, [`runtime::WidgetEvent`]s out.

pub mod capability;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod runtime;
pub mod voice;
pub mod widget;

pub use config::AssistantConfig;
pub use context::{ConversationScope, PageContext};
pub use error::{AssistantError, Result};
pub use runtime::WidgetEvent;
pub use widget::coordinator::{AssistantWidget, WidgetCommand, WidgetHandle, WidgetSnapshot};
