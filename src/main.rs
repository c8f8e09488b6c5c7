//! Storyloom Engine - Backend API for multi-modal story experience generation
//!
//! The Engine is the backend server that:
//! - Turns a short prompt into story text, narration audio and per-scene images
//! - Integrates with Ollama for story generation
//! - Integrates with ComfyUI for scene image generation
//! - Applies content guardrails and bounded retry discipline to every backend

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::review_worker::review_worker;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyloom_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Storyloom Engine");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Ollama: {}", config.ollama_base_url);
    tracing::info!(
        "  ComfyUI: {} (enabled: {})",
        config.comfyui_base_url,
        config.comfyui_enabled
    );
    tracing::info!("  TTS: {}", config.tts_base_url);
    match &config.asset_store_base_url {
        Some(url) => tracing::info!("  Asset store: {}", url),
        None => tracing::info!("  Asset store: local fallback only ({})", config.media_dir),
    }

    let server_port = config.server_port;

    // Initialize application state
    let (state, review_rx) = AppState::new(config)?;
    let state = Arc::new(state);
    tracing::info!("Application state initialized");
    tracing::info!(
        "  Pipeline latency ceiling: {}ms",
        state.pipeline.latency_ceiling().as_millis()
    );

    // Start the review handoff worker
    let review_worker_task = tokio::spawn(review_worker(review_rx));

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        // Merge REST API routes
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let server = axum::serve(listener, app);

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping workers...");
            review_worker_task.abort();
            tracing::info!("Workers stopped");
        }
    }

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
