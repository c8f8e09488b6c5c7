//! Story generation API routes

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::services::PipelineError;
use crate::domain::value_objects::{
    AudioAsset, GenerationRequest, GuardrailMode, StoryExperience, StoryProfile, Theme,
    VisualAsset,
};
use crate::infrastructure::state::AppState;

// ==================== Request/Response DTOs ====================

#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    pub prompt: String,
    pub theme: Theme,
    #[serde(default = "default_target_length")]
    pub target_length: u32,
    #[serde(default = "default_num_scenes")]
    pub num_scenes: u8,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub profile: StoryProfile,
    #[serde(default)]
    pub guardrail_mode: GuardrailMode,
}

fn default_target_length() -> u32 {
    300
}

fn default_num_scenes() -> u8 {
    4
}

fn default_voice() -> String {
    "aurora".to_string()
}

impl From<GenerateStoryRequest> for GenerationRequest {
    fn from(request: GenerateStoryRequest) -> Self {
        Self {
            prompt: request.prompt,
            theme: request.theme,
            target_length: request.target_length,
            num_scenes: request.num_scenes,
            voice: request.voice,
            profile: request.profile,
            guardrail_mode: request.guardrail_mode,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VisualAssetResponse {
    pub scene_index: usize,
    pub url: String,
    pub caption: String,
    pub is_placeholder: bool,
}

impl From<VisualAsset> for VisualAssetResponse {
    fn from(asset: VisualAsset) -> Self {
        Self {
            scene_index: asset.scene_index,
            url: asset.url,
            caption: asset.caption,
            is_placeholder: asset.is_placeholder,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AudioAssetResponse {
    pub url: String,
    pub is_placeholder: bool,
    pub duration_secs: f32,
}

impl From<AudioAsset> for AudioAssetResponse {
    fn from(asset: AudioAsset) -> Self {
        Self {
            url: asset.url,
            is_placeholder: asset.is_placeholder,
            duration_secs: asset.duration_secs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryExperienceResponse {
    pub id: String,
    pub session_id: String,
    pub story_text: String,
    pub theme: String,
    pub visual_assets: Vec<VisualAssetResponse>,
    pub audio: AudioAssetResponse,
    pub guardrail_flagged: bool,
    pub guardrail_reasons: Vec<String>,
    pub degraded: bool,
    pub created_at: String,
    pub elapsed_ms: u64,
}

impl From<StoryExperience> for StoryExperienceResponse {
    fn from(experience: StoryExperience) -> Self {
        Self {
            id: experience.id.to_string(),
            session_id: experience.session_id.to_string(),
            story_text: experience.story_text,
            theme: experience.theme.to_string(),
            visual_assets: experience
                .visual_assets
                .into_iter()
                .map(VisualAssetResponse::from)
                .collect(),
            audio: experience.audio.into(),
            guardrail_flagged: experience.guardrail.flagged,
            guardrail_reasons: experience.guardrail.reasons,
            degraded: experience.degraded,
            created_at: experience.created_at.to_rfc3339(),
            elapsed_ms: experience.elapsed_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PipelineLimitsResponse {
    /// Computable worst-case end-to-end latency for one request
    pub latency_ceiling_ms: u64,
    pub image_backend_enabled: bool,
}

// ==================== Handlers ====================

/// Generate a full story experience
///
/// Degraded (placeholder-containing) successes are still 200 responses;
/// only the fatal taxonomy maps to error statuses.
pub async fn generate_story(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateStoryRequest>,
) -> Result<Json<StoryExperienceResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request: GenerationRequest = request.into();

    let experience = state
        .pipeline
        .run(request)
        .await
        .map_err(map_pipeline_error)?;

    Ok(Json(experience.into()))
}

/// Report the pipeline's static latency ceiling and backend availability
pub async fn pipeline_limits(
    State(state): State<Arc<AppState>>,
) -> Json<PipelineLimitsResponse> {
    Json(PipelineLimitsResponse {
        latency_ceiling_ms: state.pipeline.latency_ceiling().as_millis() as u64,
        image_backend_enabled: state.config.comfyui_enabled,
    })
}

fn map_pipeline_error(error: PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, category) = match &error {
        PipelineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        PipelineError::GuardrailViolation { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "guardrail_violation")
        }
        PipelineError::UpstreamUnavailable { .. } => {
            (StatusCode::BAD_GATEWAY, "upstream_unavailable")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: category,
            message: error.to_string(),
        }),
    )
}
