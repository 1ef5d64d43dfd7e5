//! HTTP client for the document question-answering service
//!
//! The service exposes three operations, all under one API prefix:
//! - `POST /upload` — multipart document ingestion, returns a session token
//! - `POST /query` — question against an uploaded document, returns the answer
//! - `POST /tts` — speech synthesis, returns raw audio bytes
//!
//! [`ServiceClient`] implements [`docchat_core::QueryService`] over these.

mod client;
mod wire;

pub use client::{ClientBuildError, ClientConfig, ServiceClient};
pub use wire::SessionStatus;
