//! Ports for the generative backends
//!
//! Each backend is an opaque remote capability with latency in the tens of
//! seconds. All three ports share the [`BackendError`] taxonomy so the
//! retry layer can classify failures uniformly.

use async_trait::async_trait;

use crate::domain::value_objects::BackendErrorKind;

/// Failure from a generative backend, classified for retry decisions
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("rate limited by backend")]
    RateLimited,
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("backend rejected request: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Api(String),
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::Timeout => BackendErrorKind::Timeout,
            Self::Connection(_) => BackendErrorKind::Connection,
            Self::RateLimited => BackendErrorKind::RateLimited,
            Self::Auth(_) => BackendErrorKind::Auth,
            Self::Validation(_) => BackendErrorKind::Validation,
            Self::Api(_) => BackendErrorKind::Api,
        }
    }
}

/// Text generation backend (`generateText(promptPayload) -> text | error`)
#[async_trait]
pub trait TextGenerationPort: Send + Sync {
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, BackendError>;
}

/// Image generation backend (`generateImage(promptPayload) -> bytes | error`)
#[async_trait]
pub trait ImageGenerationPort: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, BackendError>;
}

/// Audio synthesis backend (`synthesize(text, voice) -> bytes | error`)
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, BackendError>;
}
