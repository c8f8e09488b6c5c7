//! Ollama client for story text generation (OpenAI-compatible API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{BackendError, TextGenerationPort};
use crate::infrastructure::classify::{classify_status, classify_transport};

/// Client for an OpenAI-compatible chat completions endpoint
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageBody>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessageBody {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[async_trait]
impl TextGenerationPort for OllamaClient {
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, BackendError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageBody {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessageBody {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            // Slightly creative for storytelling
            temperature: 0.8,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(classify_transport)?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::Api("no choices in completion".to_string()))
    }
}
