//! Story generation - turns a validated request into a story draft
//!
//! Builds a deterministic prompt from the request and listener profile,
//! then calls the text backend through the retrying caller. There is no
//! placeholder story text: narrative content cannot be safely synthesized
//! generically, so exhausted retries are fatal to the request.

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::outbound::{BackendError, TextGenerationPort};
use crate::application::services::retry::{self, RetryFailure};
use crate::domain::value_objects::{GenerationRequest, RetryPolicy, StoryDraft};

/// Service for generating story text through an external backend
pub struct StoryGenerator<T: TextGenerationPort> {
    backend: Arc<T>,
    policy: RetryPolicy,
}

impl<T: TextGenerationPort> StoryGenerator<T> {
    pub fn new(backend: Arc<T>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate a story draft for the request
    ///
    /// An empty completion is treated as an upstream error and retried;
    /// downstream chunking relies on drafts never being blank.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<StoryDraft, RetryFailure> {
        let system_prompt = build_system_prompt(request);
        let user_prompt = build_user_prompt(request);
        let started = Instant::now();

        let backend = self.backend.clone();
        let done = retry::call("story_text", &self.policy, move || {
            let backend = backend.clone();
            let system_prompt = system_prompt.clone();
            let user_prompt = user_prompt.clone();
            async move {
                let text = backend.generate_text(&system_prompt, &user_prompt).await?;
                if text.trim().is_empty() {
                    return Err(BackendError::Api("empty completion".to_string()));
                }
                Ok(text)
            }
        })
        .await?;

        let draft = StoryDraft::new(done.value, started.elapsed(), done.attempts);
        tracing::info!(
            words = draft.word_count,
            attempts = draft.attempts,
            latency_ms = draft.latency.as_millis() as u64,
            "story draft generated"
        );
        Ok(draft)
    }
}

/// System prompt establishing the storyteller persona and constraints
fn build_system_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a gentle storyteller writing for young listeners.\n\n");
    prompt.push_str(&format!(
        "THEME: {} - {}\n",
        request.theme,
        request.theme.narrative_direction()
    ));
    prompt.push_str(&format!(
        "LENGTH: approximately {} words\n",
        request.target_length
    ));
    prompt.push_str("\nWrite flowing prose with paragraphs separated by blank lines.\n");
    prompt.push_str("Do not include headings, lists or stage directions.\n");

    prompt
}

/// User prompt merging the request prompt with every non-empty profile
/// field; the phrasing is fixed so omission is observable in tests
fn build_user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Tell a story about: {}\n", request.prompt.trim()));

    let profile = &request.profile;
    if let Some(mood) = profile.mood.as_deref().filter(|m| !m.trim().is_empty()) {
        prompt.push_str(&format!("\nLISTENER MOOD: {}\n", mood.trim()));
    }
    if let Some(routine) = profile.routine.as_deref().filter(|r| !r.trim().is_empty()) {
        prompt.push_str(&format!("BEDTIME ROUTINE: {}\n", routine.trim()));
    }
    if !profile.favorite_characters.is_empty() {
        prompt.push_str("FAVORITE CHARACTERS TO INCLUDE:\n");
        for character in &profile.favorite_characters {
            prompt.push_str(&format!("- {}\n", character));
        }
    }
    if !profile.calming_elements.is_empty() {
        prompt.push_str("CALMING ELEMENTS TO WEAVE IN:\n");
        for element in &profile.calming_elements {
            prompt.push_str(&format!("- {}\n", element));
        }
    }

    prompt
}
