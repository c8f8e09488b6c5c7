//! TTS client for narration synthesis (OpenAI-compatible speech endpoint)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::application::ports::outbound::{BackendError, SpeechSynthesisPort};
use crate::infrastructure::classify::{classify_status, classify_transport};

/// Client for an OpenAI-compatible `/audio/speech` endpoint
pub struct SpeechClient {
    client: Client,
    base_url: String,
}

impl SpeechClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    input: String,
    voice: String,
    response_format: String,
}

#[async_trait]
impl SpeechSynthesisPort for SpeechClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, BackendError> {
        let request = SpeechRequest {
            input: text.to_string(),
            voice: voice.to_string(),
            response_format: "mp3".to_string(),
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let bytes = response.bytes().await.map_err(classify_transport)?;
        Ok(bytes.to_vec())
    }
}
