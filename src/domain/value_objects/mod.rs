//! Value objects - Immutable objects defined by their attributes

mod assets;
mod ids;
mod request;
mod retry_policy;
mod story;

pub use assets::{AudioAsset, GuardrailSummary, StoryExperience, VisualAsset};
pub use ids::*;
pub use request::{
    GenerationRequest, GuardrailMode, RequestValidationError, StoryProfile, Theme, MAX_PROMPT_CHARS,
    MAX_SCENES, MAX_TARGET_LENGTH, MIN_SCENES, MIN_TARGET_LENGTH,
};
pub use retry_policy::{BackendErrorKind, RetryPolicy};
pub use story::{SceneChunk, StoryDraft};
