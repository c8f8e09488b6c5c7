//! Background worker draining the review channel
//!
//! The moderation/review collaborator is external; this worker is the
//! handoff point. Events are serialized and emitted on a dedicated log
//! target that the review tooling tails. The pipeline never waits on it.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::application::services::ReviewEvent;

/// Run the review worker until the channel closes
///
/// This should be spawned as a background task
pub async fn review_worker(mut rx: UnboundedReceiver<ReviewEvent>) {
    tracing::info!("Starting review worker");
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                tracing::info!(target: "storyloom::review", %payload, "queued for human review");
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize review event");
            }
        }
    }
    tracing::info!("Review worker shutting down");
}
