//! Hands-free conversation loop
//!
//! The one genuinely stateful part of the client: the logic that coordinates
//! microphone capture, the remote query, spoken playback and automatic
//! re-listening into a continuous loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ activate ┌─────────────────┐ utterance ┌─────────────┐
//! │ Conversation │─────────▶│ Turn Controller │──────────▶│ ChatSession │
//! │     Mode     │          │  (state machine)│           │ single-flight│
//! └──────────────┘          └───────┬─────────┘           └──────┬──────┘
//!        ▲                          │ answer                     │ query
//!        │ deactivate               ▼                            ▼
//!        │                  ┌────────────────┐          ┌───────────────┐
//!        └──────────────────│ SpeechPlayback │          │ QueryService  │
//!            (uniform exit) └────────────────┘          └───────────────┘
//! ```
//!
//! Everything the loop owns (timers, the capture window, the playback wait)
//! lives inside one spawned task, so deactivation cancels all of it at once.

pub mod controller;
pub mod events;
pub mod mode;
pub mod playback;
pub mod session;

pub use controller::{Phase, TurnController};
pub use events::ConversationEvent;
pub use mode::ConversationMode;
pub use playback::SynthesizedPlayback;
pub use session::ChatSession;
