//! Application services - The generation pipeline and its components
//!
//! Each service follows hexagonal architecture principles: generic over
//! the outbound ports it calls, returning domain value objects. The
//! orchestrator composes them into the full pipeline.

pub mod content_guard;
pub mod moderation;
pub mod narration_generator;
pub mod orchestrator;
pub mod retry;
pub mod scene_chunker;
pub mod story_generator;
pub mod visual_generator;

pub use content_guard::{ContentGuard, Decision, Verdict};
pub use moderation::{AssetMedium, ReviewEvent, ReviewQueue};
pub use narration_generator::NarrationGenerator;
pub use orchestrator::{
    GuardCheckpoint, PipelineError, PipelineStage, StoryPipeline,
};
pub use retry::{Attempted, RetryFailure};
pub use story_generator::StoryGenerator;
pub use visual_generator::VisualGenerator;
