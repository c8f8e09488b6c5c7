//! Application configuration

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Ollama API base URL (OpenAI-compatible)
    pub ollama_base_url: String,
    /// Default model for story generation
    pub ollama_model: String,

    /// ComfyUI server URL
    pub comfyui_base_url: String,
    /// When false the image backend is never called and every scene gets
    /// a placeholder
    pub comfyui_enabled: bool,

    /// TTS server URL (OpenAI-compatible speech endpoint)
    pub tts_base_url: String,

    /// Asset store base URL; unset means every upload falls back to the
    /// local media directory
    pub asset_store_base_url: Option<String>,
    /// Local media directory for fallback asset paths
    pub media_dir: String,

    /// Maximum concurrent image generation calls per request
    pub image_workers: usize,

    /// HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),

            comfyui_base_url: env::var("COMFYUI_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8188".to_string()),
            comfyui_enabled: env::var("COMFYUI_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("COMFYUI_ENABLED must be true or false")?,

            tts_base_url: env::var("TTS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8880/v1".to_string()),

            asset_store_base_url: env::var("ASSET_STORE_BASE_URL").ok(),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "data/media".to_string()),

            image_workers: env::var("IMAGE_WORKERS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("IMAGE_WORKERS must be a positive integer")?,

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}
