//! Conversation events
//!
//! Broadcast to whoever renders status text. Transient failures (no speech,
//! synthesis errors) arrive here and never interrupt the mode; fatal ones
//! are followed by `Deactivated`.

use crate::controller::Phase;

/// Events emitted by the turn controller
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    /// Conversation mode came up (settle delay elapsed)
    Activated,
    /// Phase transition
    PhaseChanged { old: Phase, new: Phase },
    /// Pre-listen countdown tick
    CountdownTick { remaining: u8 },
    /// A capture window opened
    ListeningStarted,
    /// A capture window yielded text
    UtteranceCaptured { text: String },
    /// A capture window closed with nothing usable; `attempt` counts
    /// consecutive silent windows
    NoSpeech { attempt: u32 },
    /// Wake word configured but absent; utterance discarded
    WakeWordMissing { text: String },
    /// A question went to the query service
    QuerySubmitted { question: String },
    /// The service answered
    AnswerReceived { text: String },
    /// Spoken playback of the answer began
    SpeakingStarted,
    /// Synthesis or playback failed; the loop continues as if playback
    /// completed
    PlaybackFailed { message: String },
    /// The query failed; an error turn was recorded
    TurnFailed { message: String },
    /// Conversation mode went down
    Deactivated { reason: String },
}
