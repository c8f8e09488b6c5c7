//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Ollama: story text generation
//! - ComfyUI: scene image generation
//! - Speech: narration synthesis
//! - Asset store: remote uploads with local fallback, experience handoff
//! - HTTP: REST API routes
//! - Review worker: drains the moderation handoff channel
//! - Config: application configuration
//! - State: shared application state

pub mod asset_store;
pub mod classify;
pub mod comfyui;
pub mod config;
pub mod http;
pub mod ollama;
pub mod review_worker;
pub mod speech;
pub mod state;
