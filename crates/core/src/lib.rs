//! Core traits and types for the document chat client
//!
//! This crate provides the foundational types used across all other crates:
//! - Adapter traits for pluggable backends (speech capture, playback, query service)
//! - Session and turn types
//! - Language definitions
//! - Error types
//! - Upload validation rules

pub mod conversation;
pub mod error;
pub mod language;
pub mod session;
pub mod traits;
pub mod upload;

pub use conversation::{Turn, TurnOrigin};
pub use error::{CaptureError, QueryError, SpeechSynthesisError, SubmitError, UploadError};
pub use language::Language;
pub use session::{DocumentSession, DocumentUpload, SessionId, UploadReceipt};
pub use upload::{validate_upload, ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES};

pub use traits::{AudioSink, CaptureEvent, QueryService, SpeechCapture, SpeechPlayback};
