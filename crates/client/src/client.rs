//! Service client over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};

use docchat_config::ServiceConfig;
use docchat_core::{
    validate_upload, DocumentUpload, Language, QueryError, QueryService, SessionId,
    SpeechSynthesisError, UploadError, UploadReceipt,
};

use crate::wire::{QueryRequest, QueryResponse, SessionStatus, TtsRequest, UploadResponse};

/// Configuration for [`ServiceClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service origin, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Path prefix for all operations
    pub api_prefix: String,
    /// Timeout for query and synthesis requests
    pub request_timeout: Duration,
    /// Timeout for document uploads
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api/v1".to_string(),
            request_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&ServiceConfig> for ClientConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_prefix: config.api_prefix.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
        }
    }
}

impl ClientConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }
}

/// Client construction failure
#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(String);

/// HTTP client for the document question-answering service
pub struct ServiceClient {
    config: ClientConfig,
    client: Client,
}

impl ServiceClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Fetch the server-side status of a session
    pub async fn status(&self, session: &SessionId) -> Result<SessionStatus, QueryError> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("/status/{}", session)))
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(QueryError::InvalidSession),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(QueryError::Service {
                    status: status.as_u16(),
                    message,
                })
            },
            _ => response
                .json::<SessionStatus>()
                .await
                .map_err(|e| QueryError::InvalidResponse(e.to_string())),
        }
    }

    /// Discard a session server-side (best effort; called when the user
    /// starts a new upload)
    pub async fn delete_session(&self, session: &SessionId) -> Result<(), QueryError> {
        let response = self
            .client
            .delete(self.config.endpoint(&format!("/session/{}", session)))
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(QueryError::InvalidSession),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(QueryError::Service {
                    status: status.as_u16(),
                    message,
                })
            },
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl QueryService for ServiceClient {
    async fn upload(&self, upload: DocumentUpload) -> Result<UploadReceipt, UploadError> {
        // Validate before shipping anything over the wire
        validate_upload(&upload.file_name, upload.size())?;

        let part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        let form = Form::new().part("file", part);

        tracing::info!(file = %upload.file_name, "uploading document");

        let response = self
            .client
            .post(self.config.endpoint("/upload"))
            .multipart(form)
            .timeout(self.config.upload_timeout)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let response: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;

        let receipt: UploadReceipt = response.into();
        tracing::info!(
            session = %receipt.session_id,
            chunks = receipt.chunk_count,
            "document processed"
        );
        Ok(receipt)
    }

    async fn query(
        &self,
        session: &SessionId,
        question: &str,
        language: Language,
    ) -> Result<String, QueryError> {
        let request = QueryRequest {
            session_id: session.as_str(),
            question,
            language: language.code(),
        };

        let response = self
            .client
            .post(self.config.endpoint("/query"))
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(QueryError::InvalidSession);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueryError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let response: QueryResponse = response
            .json()
            .await
            .map_err(|e| QueryError::InvalidResponse(e.to_string()))?;

        Ok(response.answer)
    }

    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>, SpeechSynthesisError> {
        let request = TtsRequest {
            text,
            language: language.code(),
        };

        let response = self
            .client
            .post(self.config.endpoint("/tts"))
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechSynthesisError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechSynthesisError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechSynthesisError::Network(e.to_string()))?;

        if audio.is_empty() {
            return Err(SpeechSynthesisError::EmptyAudio);
        }

        Ok(audio.to_vec())
    }
}
