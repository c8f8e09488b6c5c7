//! Visual generation - one image asset per scene chunk
//!
//! Scenes are generated with bounded concurrency: a fixed-size semaphore
//! pool caps in-flight backend calls while scenes still parallelize.
//! Completion order is free, but the returned list always preserves scene
//! index order. A scene never fails the pipeline: retry exhaustion, a
//! disabled backend or a dead asset store all degrade to an explicitly
//! flagged placeholder with a locally addressable path.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::application::ports::outbound::{AssetStorePort, ImageGenerationPort};
use crate::application::services::retry;
use crate::domain::value_objects::{RetryPolicy, SceneChunk, SessionId, Theme, VisualAsset};

/// Service for generating scene images through an external backend
pub struct VisualGenerator<I: ImageGenerationPort, S: AssetStorePort> {
    /// `None` when the image backend is disabled by configuration, which
    /// forces placeholder mode for every scene
    backend: Option<Arc<I>>,
    store: Arc<S>,
    policy: RetryPolicy,
    semaphore: Arc<Semaphore>,
}

impl<I: ImageGenerationPort, S: AssetStorePort> VisualGenerator<I, S> {
    pub fn new(
        backend: Option<Arc<I>>,
        store: Arc<S>,
        policy: RetryPolicy,
        max_concurrent: usize,
    ) -> Self {
        Self {
            backend,
            store,
            policy,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate one asset per chunk, order preserved
    pub async fn generate_scenes(
        &self,
        session_id: SessionId,
        chunks: &[SceneChunk],
        theme: Theme,
    ) -> Vec<VisualAsset> {
        let tasks = chunks
            .iter()
            .map(|chunk| self.generate_scene(session_id, chunk, theme));
        join_all(tasks).await
    }

    async fn generate_scene(
        &self,
        session_id: SessionId,
        chunk: &SceneChunk,
        theme: Theme,
    ) -> VisualAsset {
        let started = Instant::now();

        // Permit covers backend generation only; uploads are not bounded
        // by the image pool
        let permit = self.semaphore.acquire().await.ok();
        let generated = match &self.backend {
            None => None,
            Some(backend) => {
                let prompt = build_image_prompt(chunk, theme);
                let backend = backend.clone();
                match retry::call("scene_image", &self.policy, move || {
                    let backend = backend.clone();
                    let prompt = prompt.clone();
                    async move { backend.generate_image(&prompt).await }
                })
                .await
                {
                    Ok(done) => Some(done.value),
                    Err(failure) => {
                        tracing::warn!(
                            scene = chunk.index,
                            error = %failure,
                            "image generation exhausted retries, substituting placeholder"
                        );
                        None
                    }
                }
            }
        };
        drop(permit);

        let (bytes, content_type, extension, is_placeholder) = match generated {
            Some(bytes) => (bytes, "image/png", "png", false),
            None => (
                placeholder_image(theme, &chunk.caption),
                "image/svg+xml",
                "svg",
                true,
            ),
        };

        let name = format!("{}/scene-{}.{}", session_id, chunk.index, extension);
        let url = match self.store.upload(&bytes, content_type, &name).await {
            Ok(url) => url,
            Err(error) => {
                tracing::warn!(
                    scene = chunk.index,
                    error = %error,
                    "asset store upload failed, using local fallback path"
                );
                self.store.store_local(&bytes, &name).await
            }
        };

        VisualAsset {
            scene_index: chunk.index,
            url,
            caption: chunk.caption.clone(),
            is_placeholder,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Image prompt from the chunk caption plus the theme's style suffix
fn build_image_prompt(chunk: &SceneChunk, theme: Theme) -> String {
    format!("{} {}", chunk.caption, theme.image_style())
}

/// Deterministic placeholder: a theme-colored gradient with the scene
/// caption overlaid as text
pub fn placeholder_image(theme: Theme, caption: &str) -> Vec<u8> {
    let (from, to) = theme.palette();
    let caption = escape_xml(caption);
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1024" height="576" viewBox="0 0 1024 576">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="0" y2="1">
      <stop offset="0%" stop-color="{from}"/>
      <stop offset="100%" stop-color="{to}"/>
    </linearGradient>
  </defs>
  <rect width="1024" height="576" fill="url(#bg)"/>
  <text x="512" y="300" text-anchor="middle" fill="#ffffff" font-family="serif" font-size="28">{caption}</text>
</svg>
"##
    )
    .into_bytes()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
