//! Adapter traits
//!
//! The conversation controller is written against these seams so every
//! platform capability (microphone capture, speaker playback, the remote
//! query service) can be swapped for a scripted implementation in tests.

mod capture;
mod playback;
mod query;

pub use capture::{CaptureEvent, SpeechCapture};
pub use playback::{AudioSink, SpeechPlayback};
pub use query::QueryService;
