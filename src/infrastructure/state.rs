//! Shared application state

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::application::services::{
    ContentGuard, NarrationGenerator, ReviewEvent, ReviewQueue, StoryGenerator, StoryPipeline,
    VisualGenerator,
};
use crate::domain::value_objects::RetryPolicy;
use crate::infrastructure::asset_store::HttpAssetStore;
use crate::infrastructure::comfyui::ComfyUIClient;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::speech::SpeechClient;

/// The pipeline wired against the concrete backend clients
pub type EnginePipeline =
    StoryPipeline<OllamaClient, ComfyUIClient, SpeechClient, HttpAssetStore, HttpAssetStore>;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: EnginePipeline,
}

impl AppState {
    /// Construct state and the review-channel receiver its worker drains
    pub fn new(config: AppConfig) -> Result<(Self, UnboundedReceiver<ReviewEvent>)> {
        let text_client = Arc::new(OllamaClient::new(
            &config.ollama_base_url,
            &config.ollama_model,
        ));
        let image_client = config
            .comfyui_enabled
            .then(|| Arc::new(ComfyUIClient::new(&config.comfyui_base_url)));
        let speech_client = Arc::new(SpeechClient::new(&config.tts_base_url));
        let store = Arc::new(HttpAssetStore::new(
            config.asset_store_base_url.clone(),
            &config.media_dir,
        ));

        let (review, review_rx) = ReviewQueue::new();

        let pipeline = StoryPipeline::new(
            ContentGuard::new(),
            StoryGenerator::new(text_client, RetryPolicy::text_default()),
            VisualGenerator::new(
                image_client,
                store.clone(),
                RetryPolicy::image_default(),
                config.image_workers,
            ),
            NarrationGenerator::new(speech_client, store.clone(), RetryPolicy::audio_default()),
            store,
            review,
        );

        Ok((Self { config, pipeline }, review_rx))
    }
}
