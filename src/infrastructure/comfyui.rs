//! ComfyUI client for scene image generation
//!
//! The port contract is a single `generate_image(prompt) -> bytes` call;
//! internally the client queues a workflow, polls prompt history until it
//! completes and downloads the first output image. The caller's
//! per-attempt timeout still bounds the whole exchange.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::outbound::{BackendError, ImageGenerationPort};
use crate::infrastructure::classify::{classify_status, classify_transport};

/// Client for ComfyUI API
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ComfyUIClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(500),
            max_polls: 240,
        }
    }

    /// Queue a workflow for execution
    async fn queue_prompt(
        &self,
        workflow: serde_json::Value,
    ) -> Result<QueueResponse, BackendError> {
        let request = QueuePromptRequest {
            prompt: workflow,
            client_id: Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        response.json().await.map_err(classify_transport)
    }

    /// Get the history of a queued prompt
    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, BackendError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        response.json().await.map_err(classify_transport)
    }

    /// Download a generated image
    async fn get_image(
        &self,
        filename: &str,
        subfolder: &str,
        folder_type: &str,
    ) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", filename),
                ("subfolder", subfolder),
                ("type", folder_type),
            ])
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

    /// Check if the server is available
    pub async fn health_check(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(format!("{}/system_stats", self.base_url))
            .send()
            .await
            .map_err(classify_transport)?;

        Ok(response.status().is_success())
    }
}

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    prompts: HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
struct PromptHistory {
    outputs: HashMap<String, NodeOutput>,
    status: PromptStatus,
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    images: Option<Vec<ImageOutput>>,
}

#[derive(Debug, Deserialize)]
struct ImageOutput {
    filename: String,
    subfolder: String,
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct PromptStatus {
    completed: bool,
}

/// Minimal text-to-image workflow for a scene prompt
fn build_workflow(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "prompt": {
            "positive": prompt,
            "negative": "text, watermark, frightening imagery",
            "width": 1024,
            "height": 576,
        }
    })
}

#[async_trait]
impl ImageGenerationPort for ComfyUIClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        let queued = self.queue_prompt(build_workflow(prompt)).await?;
        tracing::debug!(prompt_id = %queued.prompt_id, "queued ComfyUI prompt");

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let history = self.get_history(&queued.prompt_id).await?;
            let Some(entry) = history.prompts.get(&queued.prompt_id) else {
                continue;
            };
            if !entry.status.completed {
                continue;
            }

            let image = entry
                .outputs
                .values()
                .filter_map(|output| output.images.as_deref())
                .flatten()
                .next()
                .ok_or_else(|| {
                    BackendError::Api("prompt completed without image outputs".to_string())
                })?;

            return self
                .get_image(&image.filename, &image.subfolder, &image.r#type)
                .await;
        }

        Err(BackendError::Timeout)
    }
}
