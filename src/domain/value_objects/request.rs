//! Generation request model and validation
//!
//! A `GenerationRequest` is immutable once accepted: the request surface
//! validates shape and bounds before the pipeline runs, so every component
//! downstream can rely on the bounds documented here.

use serde::{Deserialize, Serialize};

/// Bounds enforced by [`GenerationRequest::validate`]
pub const MIN_SCENES: u8 = 1;
pub const MAX_SCENES: u8 = 8;
pub const MIN_TARGET_LENGTH: u32 = 50;
pub const MAX_TARGET_LENGTH: u32 = 2000;
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Visual/narrative theme for a story experience
///
/// A closed set: each variant carries its own narrative direction for the
/// text backend, a style suffix for image prompts and a gradient palette
/// for placeholder images. Unknown theme strings are rejected at the
/// request surface during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Bedtime,
    Adventure,
    Ocean,
    Forest,
    Space,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bedtime => "bedtime",
            Self::Adventure => "adventure",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Space => "space",
        }
    }

    /// Narrative direction included in the text-backend prompt
    pub fn narrative_direction(&self) -> &'static str {
        match self {
            Self::Bedtime => "a gentle, soothing tone that winds down toward sleep",
            Self::Adventure => "a warm, curious journey with a safe and happy ending",
            Self::Ocean => "a calm seaside world of waves, tides and friendly sea creatures",
            Self::Forest => "a quiet woodland world of soft moss, old trees and small animals",
            Self::Space => "a dreamy night-sky voyage among kind stars and slow-drifting planets",
        }
    }

    /// Style suffix appended to every image prompt for this theme
    pub fn image_style(&self) -> &'static str {
        match self {
            Self::Bedtime => "soft watercolor illustration, warm lantern light, muted pastels",
            Self::Adventure => "storybook illustration, golden hour light, gentle colors",
            Self::Ocean => "storybook illustration, turquoise water, soft evening light",
            Self::Forest => "storybook illustration, mossy greens, dappled light",
            Self::Space => "storybook illustration, deep indigo sky, soft starlight",
        }
    }

    /// Gradient stops used for deterministic placeholder images
    pub fn palette(&self) -> (&'static str, &'static str) {
        match self {
            Self::Bedtime => ("#3b2f5c", "#8a7ab8"),
            Self::Adventure => ("#b35c2e", "#e8b04a"),
            Self::Ocean => ("#1b4965", "#62b6cb"),
            Self::Forest => ("#2d4a2a", "#7fa65a"),
            Self::Space => ("#151b3d", "#5a5f9e"),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Policy variant selecting the active guardrail rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailMode {
    /// Child-safety rules for bedtime content
    BedtimeSafety,
    /// Brand-tone enforcement for marketing-facing content
    BrandCompliance,
}

impl Default for GuardrailMode {
    fn default() -> Self {
        Self::BedtimeSafety
    }
}

/// Optional listener profile merged into the story prompt
///
/// Every non-empty field is deterministically included in the prompt sent
/// to the text backend, so omission is observable in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryProfile {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub routine: Option<String>,
    #[serde(default)]
    pub favorite_characters: Vec<String>,
    #[serde(default)]
    pub calming_elements: Vec<String>,
}

/// A validated request for one story experience
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub theme: Theme,
    /// Word-count target for the generated story
    pub target_length: u32,
    /// Number of visual scenes to produce (1-8)
    pub num_scenes: u8,
    /// Narration voice identifier, passed through to the audio backend
    pub voice: String,
    #[serde(default)]
    pub profile: StoryProfile,
    #[serde(default)]
    pub guardrail_mode: GuardrailMode,
}

impl GenerationRequest {
    /// Validate request bounds before any external call is made
    pub fn validate(&self) -> Result<(), RequestValidationError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(RequestValidationError::EmptyPrompt);
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(RequestValidationError::PromptTooLong {
                len: prompt.chars().count(),
                max: MAX_PROMPT_CHARS,
            });
        }
        if !(MIN_SCENES..=MAX_SCENES).contains(&self.num_scenes) {
            return Err(RequestValidationError::SceneCountOutOfRange {
                got: self.num_scenes,
            });
        }
        if !(MIN_TARGET_LENGTH..=MAX_TARGET_LENGTH).contains(&self.target_length) {
            return Err(RequestValidationError::TargetLengthOutOfRange {
                got: self.target_length,
            });
        }
        Ok(())
    }
}

/// Rejection reasons for malformed or out-of-bounds requests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt is {len} characters, maximum is {max}")]
    PromptTooLong { len: usize, max: usize },
    #[error("num_scenes must be between {MIN_SCENES} and {MAX_SCENES}, got {got}")]
    SceneCountOutOfRange { got: u8 },
    #[error(
        "target_length must be between {MIN_TARGET_LENGTH} and {MAX_TARGET_LENGTH} words, got {got}"
    )]
    TargetLengthOutOfRange { got: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> GenerationRequest {
        GenerationRequest {
            prompt: "A sleepy fox under lantern light".to_string(),
            theme: Theme::Bedtime,
            target_length: 200,
            num_scenes: 2,
            voice: "aurora".to_string(),
            profile: StoryProfile::default(),
            guardrail_mode: GuardrailMode::BedtimeSafety,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let mut request = valid_request();
        request.prompt = "   ".to_string();
        assert_eq!(
            request.validate(),
            Err(RequestValidationError::EmptyPrompt)
        );
    }

    #[test]
    fn test_scene_count_bounds() {
        let mut request = valid_request();
        request.num_scenes = 0;
        assert!(matches!(
            request.validate(),
            Err(RequestValidationError::SceneCountOutOfRange { got: 0 })
        ));

        request.num_scenes = 9;
        assert!(matches!(
            request.validate(),
            Err(RequestValidationError::SceneCountOutOfRange { got: 9 })
        ));

        request.num_scenes = 8;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_target_length_bounds() {
        let mut request = valid_request();
        request.target_length = 10;
        assert!(matches!(
            request.validate(),
            Err(RequestValidationError::TargetLengthOutOfRange { got: 10 })
        ));

        request.target_length = 5000;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_theme_serde_round_trip() {
        let json = serde_json::to_string(&Theme::Ocean).unwrap();
        assert_eq!(json, "\"ocean\"");
        let theme: Theme = serde_json::from_str("\"space\"").unwrap();
        assert_eq!(theme, Theme::Space);
        assert!(serde_json::from_str::<Theme>("\"dungeon\"").is_err());
    }
}
