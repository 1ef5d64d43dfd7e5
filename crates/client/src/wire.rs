//! Wire types for the query service API

use serde::{Deserialize, Serialize};

use docchat_core::{SessionId, UploadReceipt};

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub session_id: String,
    pub filename: String,
    #[allow(dead_code)]
    pub status: Option<String>,
    #[allow(dead_code)]
    pub text_length: Option<usize>,
    #[serde(default)]
    pub num_chunks: usize,
    #[serde(default)]
    pub num_images_processed: usize,
    #[allow(dead_code)]
    pub message: Option<String>,
}

impl From<UploadResponse> for UploadReceipt {
    fn from(r: UploadResponse) -> Self {
        UploadReceipt {
            session_id: SessionId::new(r.session_id),
            display_name: r.filename,
            chunk_count: r.num_chunks,
            images_processed: r.num_images_processed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub session_id: &'a str,
    pub question: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub answer: String,
    #[allow(dead_code)]
    pub session_id: Option<String>,
    #[allow(dead_code)]
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TtsRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
}

/// Server-side view of an active session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub filename: String,
    #[serde(default)]
    pub text_length: usize,
    #[serde(default)]
    pub num_images: usize,
    pub status: String,
}
