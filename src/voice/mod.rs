//! Voice adapters: speech capture in, speech synthesis out.
//!
//! Both wrap an injected host capability and keep their own small state
//! machine; the widget coordinator pumps engine events into them.

pub mod input;
pub mod output;

pub use input::VoiceInputAdapter;
pub use output::VoiceOutputAdapter;
