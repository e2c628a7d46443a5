//! Host capability ports.
//!
//! Speech capture, speech synthesis and the remote assistant services are
//! host-provided and possibly absent. The widget reaches all of them
//! through the traits in this module, so the interaction logic can run
//! against fakes in tests and multiple widget instances never fight over a
//! shared host global.

pub mod http;
pub mod query;
pub mod speech;

pub use http::{HttpHistoryService, HttpQueryService};
pub use query::{HistoryService, QueryRequest, QueryResponse, QueryService};
pub use speech::{
    CaptureEvent, NullCapture, NullSynthesis, PlaybackEvent, SpeechCapture, SpeechSynthesis,
    UtteranceRequest, VoiceProfile,
};
