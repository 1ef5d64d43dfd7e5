//! Document session types
//!
//! A session identifies one uploaded document's retrieval context on the
//! remote service. It is created from a successful upload and discarded
//! client-side when the user starts a new upload or exits. The conversation
//! controller only ever borrows a session; ownership stays with the
//! top-level application state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque session token issued by the query service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the service reports back for a processed upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Session token for subsequent queries
    pub session_id: SessionId,
    /// Display name of the processed file
    pub display_name: String,
    /// Number of retrieval chunks the document was split into
    pub chunk_count: usize,
    /// Number of embedded images run through OCR/vision
    pub images_processed: usize,
}

/// One uploaded document's retrieval context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSession {
    pub id: SessionId,
    pub display_name: String,
    pub chunk_count: usize,
    pub images_processed: usize,
    pub created_at: DateTime<Utc>,
}

impl DocumentSession {
    pub fn from_receipt(receipt: UploadReceipt) -> Self {
        Self {
            id: receipt.session_id,
            display_name: receipt.display_name,
            chunk_count: receipt.chunk_count,
            images_processed: receipt.images_processed,
            created_at: Utc::now(),
        }
    }
}

/// A file to be sent to the upload operation
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Original file name, extension included
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
