//! Query service interface
//!
//! The backend (document ingestion, retrieval, answer generation, speech
//! synthesis) is an external collaborator consumed over HTTP. This trait is
//! its client-side face: three request/response operations.

use async_trait::async_trait;

use crate::error::{QueryError, SpeechSynthesisError, UploadError};
use crate::language::Language;
use crate::session::{DocumentUpload, SessionId, UploadReceipt};

/// The remote document-question-answering service
#[async_trait]
pub trait QueryService: Send + Sync + 'static {
    /// Upload a document for ingestion, returning the retrieval session
    async fn upload(&self, upload: DocumentUpload) -> Result<UploadReceipt, UploadError>;

    /// Ask a question against an uploaded document
    async fn query(
        &self,
        session: &SessionId,
        question: &str,
        language: Language,
    ) -> Result<String, QueryError>;

    /// Synthesize speech audio for `text`. An empty byte result is a
    /// failure ([`SpeechSynthesisError::EmptyAudio`]).
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>, SpeechSynthesisError>;
}
