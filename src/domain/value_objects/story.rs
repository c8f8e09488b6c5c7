//! Story drafts and scene chunks
//!
//! A `StoryDraft` is the immutable output of the text backend; a rejected
//! draft is discarded, never edited. `SceneChunk`s are derived from an
//! accepted draft and live for a single pipeline run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Generated story text plus generation metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub text: String,
    pub word_count: usize,
    /// Wall-clock time spent in the text backend, retries included
    pub latency: Duration,
    /// Backend attempts consumed producing this draft
    pub attempts: u32,
}

impl StoryDraft {
    pub fn new(text: String, latency: Duration, attempts: u32) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            text,
            word_count,
            latency,
            attempts,
        }
    }
}

/// A contiguous group of story paragraphs assigned to one visual scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneChunk {
    /// 0-based scene index
    pub index: usize,
    /// Paragraphs in original story order
    pub paragraphs: Vec<String>,
    /// Truncated summary used for image prompts and placeholder overlays
    pub caption: String,
}

impl SceneChunk {
    /// The chunk's full text, paragraphs rejoined with blank lines
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}
