//! Port for the external persistence collaborator
//!
//! The orchestrator hands the assembled experience off for durable
//! storage; a save failure is logged and absorbed, never surfaced to the
//! caller.

use async_trait::async_trait;

use crate::domain::value_objects::StoryExperience;

#[derive(Debug, thiserror::Error)]
pub enum ExperienceStoreError {
    #[error("persistence not configured")]
    NotConfigured,
    #[error("persistence failed: {0}")]
    Store(String),
}

#[async_trait]
pub trait ExperienceStorePort: Send + Sync {
    async fn save(&self, experience: &StoryExperience) -> Result<(), ExperienceStoreError>;
}
