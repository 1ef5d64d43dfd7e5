//! Error taxonomy for the chat client
//!
//! Adapter-level errors never cross an async boundary silently: every
//! failure is delivered through the designated error event or rejection and
//! carries enough detail to produce the user-visible codes below.

use thiserror::Error;

/// Speech capture failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The runtime has no speech-capture capability. Fatal: disables voice
    /// features entirely until the user retries manually.
    #[error("speech capture is not supported by this runtime")]
    Unsupported,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no speech detected")]
    NoSpeech,

    #[error("capture network error: {0}")]
    Network(String),

    /// A competing capture attempt is already active
    #[error("a capture attempt is already in progress")]
    Busy,

    #[error("capture backend error: {0}")]
    Backend(String),
}

impl CaptureError {
    /// Fatal errors force-exit conversation mode; everything else retries
    /// through the listening loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptureError::Unsupported)
    }
}

/// Query operation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("session is no longer valid")]
    InvalidSession,

    #[error("query request failed: {0}")]
    Network(String),

    #[error("query service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("malformed query response: {0}")]
    InvalidResponse(String),
}

/// Speech synthesis / playback failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechSynthesisError {
    #[error("synthesis request failed: {0}")]
    Network(String),

    #[error("synthesis service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The service returned zero audio bytes
    #[error("synthesis returned empty audio")]
    EmptyAudio,

    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Upload operation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("file too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("upload request failed: {0}")]
    Network(String),

    #[error("upload service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("malformed upload response: {0}")]
    InvalidResponse(String),
}

/// Submission failures surfaced by the chat session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Single-flight guarantee: a query is already outstanding
    #[error("a query is already in flight")]
    InFlight,

    #[error("question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Query(#[from] QueryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_capture_errors() {
        assert!(CaptureError::Unsupported.is_fatal());
        assert!(!CaptureError::NoSpeech.is_fatal());
        assert!(!CaptureError::PermissionDenied.is_fatal());
        assert!(!CaptureError::Network("offline".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = UploadError::TooLarge {
            size: 30 << 20,
            max: 20 << 20,
        };
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_submit_error_from_query() {
        let err: SubmitError = QueryError::InvalidSession.into();
        assert!(matches!(err, SubmitError::Query(QueryError::InvalidSession)));
    }
}
