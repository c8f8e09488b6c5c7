//! Narration generation - a single audio asset per story
//!
//! One synthesis call for the whole story text, no chunking. Narration is
//! degrade-able: retry exhaustion falls back to a flagged silent
//! placeholder instead of failing the pipeline, mirroring the visual
//! generator's asset-store contract.

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::outbound::{AssetStorePort, SpeechSynthesisPort};
use crate::application::services::retry;
use crate::domain::value_objects::{AudioAsset, RetryPolicy, SessionId};

/// Speaking rate used to estimate narration duration from word count
const WORDS_PER_SECOND: f32 = 2.5;

/// Placeholder parameters: one second of 8-bit mono silence
const PLACEHOLDER_SAMPLE_RATE: u32 = 8000;
const PLACEHOLDER_SECONDS: f32 = 1.0;

/// Service for synthesizing narration through an external backend
pub struct NarrationGenerator<A: SpeechSynthesisPort, S: AssetStorePort> {
    backend: Arc<A>,
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<A: SpeechSynthesisPort, S: AssetStorePort> NarrationGenerator<A, S> {
    pub fn new(backend: Arc<A>, store: Arc<S>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Synthesize narration for the story, falling back to a silent
    /// placeholder on retry exhaustion
    pub async fn synthesize(
        &self,
        session_id: SessionId,
        story_text: &str,
        voice: &str,
    ) -> AudioAsset {
        let started = Instant::now();

        let backend = self.backend.clone();
        let text = story_text.to_string();
        let voice_id = voice.to_string();
        let generated = retry::call("narration_audio", &self.policy, move || {
            let backend = backend.clone();
            let text = text.clone();
            let voice_id = voice_id.clone();
            async move { backend.synthesize(&text, &voice_id).await }
        })
        .await;

        let (bytes, content_type, extension, is_placeholder, duration_secs) = match generated {
            Ok(done) => {
                let words = story_text.split_whitespace().count();
                (
                    done.value,
                    "audio/mpeg",
                    "mp3",
                    false,
                    words as f32 / WORDS_PER_SECOND,
                )
            }
            Err(failure) => {
                tracing::warn!(
                    error = %failure,
                    "narration synthesis exhausted retries, substituting silent placeholder"
                );
                (
                    placeholder_audio(),
                    "audio/wav",
                    "wav",
                    true,
                    PLACEHOLDER_SECONDS,
                )
            }
        };

        let name = format!("{}/narration.{}", session_id, extension);
        let url = match self.store.upload(&bytes, content_type, &name).await {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "asset store upload failed, using local fallback path"
                );
                self.store.store_local(&bytes, &name).await
            }
        };

        tracing::info!(
            is_placeholder,
            latency_ms = started.elapsed().as_millis() as u64,
            "narration asset ready"
        );

        AudioAsset {
            url,
            is_placeholder,
            duration_secs,
        }
    }
}

/// Deterministic silent WAV: standard 44-byte PCM header plus one second
/// of midpoint samples
pub fn placeholder_audio() -> Vec<u8> {
    let data_len = (PLACEHOLDER_SAMPLE_RATE as f32 * PLACEHOLDER_SECONDS) as u32;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&PLACEHOLDER_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&PLACEHOLDER_SAMPLE_RATE.to_le_bytes()); // byte rate
    wav.extend_from_slice(&1u16.to_le_bytes()); // block align
    wav.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    // 8-bit PCM silence sits at the unsigned midpoint
    wav.resize(44 + data_len as usize, 0x80);

    wav
}
