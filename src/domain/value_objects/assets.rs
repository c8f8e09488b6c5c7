//! Generated assets and the assembled story experience
//!
//! Every asset is either a genuine generated artifact or an explicitly
//! flagged placeholder - never silently absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ExperienceId, SessionId};
use super::request::Theme;

/// One generated (or placeholder) scene image, persisted and referenced by URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualAsset {
    pub scene_index: usize,
    /// Retrievable URL from the asset store, or a locally addressable
    /// fallback path when the store was unavailable
    pub url: String,
    pub caption: String,
    pub is_placeholder: bool,
    pub latency_ms: u64,
}

/// The single narration track for a story experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub url: String,
    pub is_placeholder: bool,
    /// Estimated duration in seconds (word-rate estimate for real audio,
    /// fixed for the silent placeholder)
    pub duration_secs: f32,
}

/// Outcome summary of both guardrail checkpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailSummary {
    pub flagged: bool,
    pub reasons: Vec<String>,
}

impl GuardrailSummary {
    /// Record flag reasons from one checkpoint
    pub fn record(&mut self, reasons: Vec<String>) {
        if !reasons.is_empty() {
            self.flagged = true;
            self.reasons.extend(reasons);
        }
    }
}

/// The fully assembled multi-modal result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryExperience {
    pub id: ExperienceId,
    pub session_id: SessionId,
    pub story_text: String,
    pub theme: Theme,
    /// Exactly `num_scenes` assets, in ascending scene-index order
    pub visual_assets: Vec<VisualAsset>,
    pub audio: AudioAsset,
    pub guardrail: GuardrailSummary,
    /// True when any asset fell back to a placeholder
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guardrail_summary_records_reasons() {
        let mut summary = GuardrailSummary::default();
        assert!(!summary.flagged);

        summary.record(vec![]);
        assert!(!summary.flagged);

        summary.record(vec!["flagged term \"storm\"".to_string()]);
        summary.record(vec!["excessive exclamation marks".to_string()]);
        assert!(summary.flagged);
        assert_eq!(summary.reasons.len(), 2);
    }
}
