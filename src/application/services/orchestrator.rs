//! Pipeline orchestration - from validated request to assembled experience
//!
//! The orchestrator owns one logical execution context per request and
//! sequences guardrail -> text generation -> guardrail -> concurrent
//! fan-out to narration + visuals -> persistence -> assembly. Stages 1-5
//! are strictly sequential; stage 6 fans out with `tokio::join!`.
//! Cancellation propagates naturally: dropping the request future abandons
//! every in-flight backend call.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::application::ports::outbound::{
    AssetStorePort, ExperienceStorePort, ImageGenerationPort, SpeechSynthesisPort,
    TextGenerationPort,
};
use crate::application::services::content_guard::ContentGuard;
use crate::application::services::moderation::{AssetMedium, ReviewEvent, ReviewQueue};
use crate::application::services::narration_generator::NarrationGenerator;
use crate::application::services::retry::RetryFailure;
use crate::application::services::scene_chunker;
use crate::application::services::story_generator::StoryGenerator;
use crate::application::services::visual_generator::VisualGenerator;
use crate::domain::value_objects::{
    ExperienceId, GenerationRequest, GuardrailSummary, RequestValidationError, SessionId,
    StoryExperience,
};

/// Pipeline stages, logged as the request advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validated,
    TextGenerated,
    GuardrailPassed,
    AssetsGenerated,
    Persisted,
    Completed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::TextGenerated => "text_generated",
            Self::GuardrailPassed => "guardrail_passed",
            Self::AssetsGenerated => "assets_generated",
            Self::Persisted => "persisted",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which guardrail checkpoint produced a block verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardCheckpoint {
    Prompt,
    Draft,
}

impl std::fmt::Display for GuardCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prompt => write!(f, "input prompt"),
            Self::Draft => write!(f, "story draft"),
        }
    }
}

/// Fatal pipeline failures, surfaced verbatim to the caller
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(#[from] RequestValidationError),
    #[error("content blocked at {checkpoint}: {}", .reasons.join("; "))]
    GuardrailViolation {
        checkpoint: GuardCheckpoint,
        reasons: Vec<String>,
    },
    #[error("text backend unavailable after {attempts} attempt(s)")]
    UpstreamUnavailable {
        attempts: u32,
        #[source]
        source: RetryFailure,
    },
}

/// The pipeline coordinator, generic over every outbound port
pub struct StoryPipeline<T, I, A, S, E>
where
    T: TextGenerationPort,
    I: ImageGenerationPort,
    A: SpeechSynthesisPort,
    S: AssetStorePort,
    E: ExperienceStorePort,
{
    guard: ContentGuard,
    story: StoryGenerator<T>,
    visuals: VisualGenerator<I, S>,
    narration: NarrationGenerator<A, S>,
    experiences: Arc<E>,
    review: ReviewQueue,
}

impl<T, I, A, S, E> StoryPipeline<T, I, A, S, E>
where
    T: TextGenerationPort,
    I: ImageGenerationPort,
    A: SpeechSynthesisPort,
    S: AssetStorePort,
    E: ExperienceStorePort,
{
    pub fn new(
        guard: ContentGuard,
        story: StoryGenerator<T>,
        visuals: VisualGenerator<I, S>,
        narration: NarrationGenerator<A, S>,
        experiences: Arc<E>,
        review: ReviewQueue,
    ) -> Self {
        Self {
            guard,
            story,
            visuals,
            narration,
            experiences,
            review,
        }
    }

    /// Worst-case wall-clock budget for one request: the text stage plus
    /// the slower arm of the asset fan-out, everything timing out and
    /// backing off maximally
    pub fn latency_ceiling(&self) -> std::time::Duration {
        let assets = self
            .visuals
            .policy()
            .worst_case_latency()
            .max(self.narration.policy().worst_case_latency());
        self.story.policy().worst_case_latency() + assets
    }

    /// Run one request through the full pipeline
    pub async fn run(
        &self,
        request: GenerationRequest,
    ) -> Result<StoryExperience, PipelineError> {
        let started = Instant::now();
        let session_id = SessionId::new();
        let mut summary = GuardrailSummary::default();

        // Stage 1: validate request shape before any external call
        request.validate()?;
        self.log_stage(session_id, PipelineStage::Validated);

        // Stage 2: guard the raw prompt; a block here means zero backend
        // calls were made for this request
        let verdict = self.guard.evaluate(&request.prompt, request.guardrail_mode);
        if verdict.is_block() {
            return Err(self.fail_guarded(session_id, GuardCheckpoint::Prompt, verdict.reasons));
        }
        summary.record(verdict.reasons);

        // Stage 3: story text is the one non-degradable artifact
        let draft = self.story.generate(&request).await.map_err(|failure| {
            tracing::error!(
                session = %session_id,
                error = %failure,
                "pipeline failed: text backend unavailable"
            );
            PipelineError::UpstreamUnavailable {
                attempts: failure.attempts,
                source: failure,
            }
        })?;
        self.log_stage(session_id, PipelineStage::TextGenerated);

        // Stage 4: guard the draft; expensive generation is still
        // discarded rather than returning partially-blocked content
        let verdict = self.guard.evaluate(&draft.text, request.guardrail_mode);
        if verdict.is_block() {
            return Err(self.fail_guarded(session_id, GuardCheckpoint::Draft, verdict.reasons));
        }
        summary.record(verdict.reasons);
        self.log_stage(session_id, PipelineStage::GuardrailPassed);

        // Stage 5: deterministic chunking, one chunk per requested scene
        let chunks = scene_chunker::chunk(&draft.text, request.num_scenes as usize);

        // Stage 6: fan out narration and visuals; both complete (success
        // or fallback), neither fails fatally
        let (visual_assets, audio) = tokio::join!(
            self.visuals
                .generate_scenes(session_id, &chunks, request.theme),
            self.narration
                .synthesize(session_id, &draft.text, &request.voice),
        );
        self.log_stage(session_id, PipelineStage::AssetsGenerated);

        let degraded =
            visual_assets.iter().any(|a| a.is_placeholder) || audio.is_placeholder;
        self.emit_review_events(session_id, &summary, &visual_assets, &audio);

        // Stage 7: assemble and hand off; persistence failure is logged,
        // never surfaced
        let experience = StoryExperience {
            id: ExperienceId::new(),
            session_id,
            story_text: draft.text,
            theme: request.theme,
            visual_assets,
            audio,
            guardrail: summary,
            degraded,
            created_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        match self.experiences.save(&experience).await {
            Ok(()) => self.log_stage(session_id, PipelineStage::Persisted),
            Err(error) => {
                tracing::warn!(
                    session = %session_id,
                    error = %error,
                    "experience persistence failed, returning in-memory result"
                );
            }
        }

        self.log_stage(session_id, PipelineStage::Completed);
        Ok(experience)
    }

    fn log_stage(&self, session_id: SessionId, stage: PipelineStage) {
        tracing::debug!(session = %session_id, stage = %stage, "pipeline stage reached");
    }

    fn fail_guarded(
        &self,
        session_id: SessionId,
        checkpoint: GuardCheckpoint,
        reasons: Vec<String>,
    ) -> PipelineError {
        tracing::warn!(
            session = %session_id,
            checkpoint = %checkpoint,
            ?reasons,
            "pipeline failed: guardrail block"
        );
        PipelineError::GuardrailViolation {
            checkpoint,
            reasons,
        }
    }

    fn emit_review_events(
        &self,
        session_id: SessionId,
        summary: &GuardrailSummary,
        visual_assets: &[crate::domain::value_objects::VisualAsset],
        audio: &crate::domain::value_objects::AudioAsset,
    ) {
        if summary.flagged {
            self.review.publish(ReviewEvent::ContentFlagged {
                session_id,
                reasons: summary.reasons.clone(),
            });
        }
        for asset in visual_assets.iter().filter(|a| a.is_placeholder) {
            self.review.publish(ReviewEvent::PlaceholderAsset {
                session_id,
                medium: AssetMedium::Image,
                reference: asset.url.clone(),
            });
        }
        if audio.is_placeholder {
            self.review.publish(ReviewEvent::PlaceholderAsset {
                session_id,
                medium: AssetMedium::Audio,
                reference: audio.url.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::application::ports::outbound::{
        AssetStoreError, BackendError, ExperienceStoreError,
    };
    use crate::domain::value_objects::{
        BackendErrorKind, GuardrailMode, RetryPolicy, StoryProfile, Theme,
    };

    const STORY: &str = "The fox found a lantern by the old oak.\n\n\
        It carried the light gently down the hill.\n\n\
        At the bottom, the warm den was waiting.\n\n\
        The fox curled up and drifted off to sleep.";

    struct MockText {
        calls: AtomicUsize,
        response: Result<String, BackendError>,
    }

    #[async_trait]
    impl TextGenerationPort for MockText {
        async fn generate_text(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    struct MockImages {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerationPort for MockImages {
        async fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"png".to_vec())
        }
    }

    struct MockSpeech {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesisPort for MockSpeech {
        async fn synthesize(&self, _text: &str, _voice: &str) -> Result<Vec<u8>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"mp3".to_vec())
        }
    }

    struct MockStore {
        fail_uploads: bool,
    }

    #[async_trait]
    impl AssetStorePort for MockStore {
        async fn upload(
            &self,
            _bytes: &[u8],
            _content_type: &str,
            name: &str,
        ) -> Result<String, AssetStoreError> {
            if self.fail_uploads {
                Err(AssetStoreError::Upload("store down".to_string()))
            } else {
                Ok(format!("https://assets.example/{name}"))
            }
        }

        async fn store_local(&self, _bytes: &[u8], name: &str) -> String {
            format!("file:///var/media/{name}")
        }
    }

    struct MockExperiences {
        saves: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ExperienceStorePort for MockExperiences {
        async fn save(&self, _experience: &StoryExperience) -> Result<(), ExperienceStoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ExperienceStoreError::Store("db down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        text: Arc<MockText>,
        images: Arc<MockImages>,
        speech: Arc<MockSpeech>,
        experiences: Arc<MockExperiences>,
        review_rx: UnboundedReceiver<ReviewEvent>,
        pipeline: StoryPipeline<MockText, MockImages, MockSpeech, MockStore, MockExperiences>,
    }

    struct HarnessConfig {
        text_response: Result<String, BackendError>,
        images_enabled: bool,
        store_fails: bool,
        experiences_fail: bool,
    }

    impl Default for HarnessConfig {
        fn default() -> Self {
            Self {
                text_response: Ok(STORY.to_string()),
                images_enabled: true,
                store_fails: false,
                experiences_fail: false,
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_backoff: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_jitter: Duration::ZERO,
            attempt_timeout: Duration::from_millis(200),
            retryable: vec![
                BackendErrorKind::Timeout,
                BackendErrorKind::Connection,
                BackendErrorKind::RateLimited,
            ],
        }
    }

    fn harness(config: HarnessConfig) -> Harness {
        let text = Arc::new(MockText {
            calls: AtomicUsize::new(0),
            response: config.text_response,
        });
        let images = Arc::new(MockImages {
            calls: AtomicUsize::new(0),
        });
        let speech = Arc::new(MockSpeech {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MockStore {
            fail_uploads: config.store_fails,
        });
        let experiences = Arc::new(MockExperiences {
            saves: AtomicUsize::new(0),
            fail: config.experiences_fail,
        });
        let (review, review_rx) = ReviewQueue::new();

        let pipeline = StoryPipeline::new(
            ContentGuard::new(),
            StoryGenerator::new(text.clone(), fast_policy()),
            VisualGenerator::new(
                config.images_enabled.then(|| images.clone()),
                store.clone(),
                fast_policy(),
                2,
            ),
            NarrationGenerator::new(speech.clone(), store, fast_policy()),
            experiences.clone(),
            review,
        );

        Harness {
            text,
            images,
            speech,
            experiences,
            review_rx,
            pipeline,
        }
    }

    fn request() -> GenerationRequest {
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

    #[tokio::test]
    async fn test_healthy_backends_yield_complete_experience() {
        let mut harness = harness(HarnessConfig::default());

        let experience = harness.pipeline.run(request()).await.unwrap();

        assert_eq!(experience.visual_assets.len(), 2);
        for (i, asset) in experience.visual_assets.iter().enumerate() {
            assert_eq!(asset.scene_index, i);
            assert!(!asset.is_placeholder);
            assert!(!asset.caption.is_empty());
        }
        assert!(!experience.audio.is_placeholder);
        assert!(!experience.guardrail.flagged);
        assert!(!experience.degraded);
        assert_eq!(experience.story_text, STORY);

        assert_eq!(harness.text.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.images.calls.load(Ordering::SeqCst), 2);
        assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.experiences.saves.load(Ordering::SeqCst), 1);
        assert!(harness.review_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_blocked_prompt_makes_zero_backend_calls() {
        let harness = harness(HarnessConfig::default());
        let mut blocked = request();
        blocked.prompt = "A fox with a knife".to_string();

        let error = harness.pipeline.run(blocked).await.unwrap_err();

        assert!(matches!(
            error,
            PipelineError::GuardrailViolation {
                checkpoint: GuardCheckpoint::Prompt,
                ..
            }
        ));
        assert_eq!(harness.text.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blocked_draft_discards_generation() {
        let harness = harness(HarnessConfig {
            text_response: Ok("The fox found a knife in the woods.".to_string()),
            ..HarnessConfig::default()
        });

        let error = harness.pipeline.run(request()).await.unwrap_err();

        assert!(matches!(
            error,
            PipelineError::GuardrailViolation {
                checkpoint: GuardCheckpoint::Draft,
                ..
            }
        ));
        // Text was generated, but nothing downstream ran
        assert_eq!(harness.text.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_any_call() {
        let harness = harness(HarnessConfig::default());
        let mut invalid = request();
        invalid.num_scenes = 0;

        let error = harness.pipeline.run(invalid).await.unwrap_err();

        assert!(matches!(error, PipelineError::Validation(_)));
        assert_eq!(harness.text.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_image_backend_degrades_all_scenes() {
        let mut harness = harness(HarnessConfig {
            images_enabled: false,
            ..HarnessConfig::default()
        });

        let experience = harness.pipeline.run(request()).await.unwrap();

        assert_eq!(experience.visual_assets.len(), 2);
        for asset in &experience.visual_assets {
            assert!(asset.is_placeholder);
            assert!(!asset.caption.is_empty());
        }
        assert!(!experience.audio.is_placeholder);
        assert!(experience.degraded);

        // One review event per placeholder scene
        let mut placeholder_events = 0;
        while let Ok(event) = harness.review_rx.try_recv() {
            if matches!(event, ReviewEvent::PlaceholderAsset { .. }) {
                placeholder_events += 1;
            }
        }
        assert_eq!(placeholder_events, 2);
    }

    #[tokio::test]
    async fn test_store_outage_still_completes_with_local_paths() {
        let harness = harness(HarnessConfig {
            store_fails: true,
            experiences_fail: true,
            ..HarnessConfig::default()
        });

        let experience = harness.pipeline.run(request()).await.unwrap();

        for asset in &experience.visual_assets {
            assert!(asset.url.starts_with("file:///var/media/"));
        }
        assert!(experience.audio.url.starts_with("file:///var/media/"));
        // Persistence was attempted and its failure absorbed
        assert_eq!(harness.experiences.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flagged_prompt_completes_with_summary() {
        let mut harness = harness(HarnessConfig::default());
        let mut flagged = request();
        flagged.prompt = "A fox hides from the storm".to_string();

        let experience = harness.pipeline.run(flagged).await.unwrap();

        assert!(experience.guardrail.flagged);
        assert!(experience.guardrail.reasons[0].contains("storm"));

        let event = harness.review_rx.try_recv().unwrap();
        assert!(matches!(event, ReviewEvent::ContentFlagged { .. }));
    }

    #[tokio::test]
    async fn test_text_backend_outage_is_fatal() {
        let harness = harness(HarnessConfig {
            text_response: Err(BackendError::Connection("refused".to_string())),
            ..HarnessConfig::default()
        });

        let error = harness.pipeline.run(request()).await.unwrap_err();

        match error {
            PipelineError::UpstreamUnavailable { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
        assert_eq!(harness.images.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_latency_ceiling_is_computable() {
        let harness = harness(HarnessConfig::default());
        let ceiling = harness.pipeline.latency_ceiling();
        // Two stages of two 200ms attempts plus millisecond backoffs
        assert!(ceiling >= Duration::from_millis(800));
        assert!(ceiling < Duration::from_secs(1));
    }
}
