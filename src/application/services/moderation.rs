//! Review handoff - fire-and-forget events for the moderation collaborator
//!
//! Flag verdicts and placeholder-asset events are handed to an unbounded
//! channel the pipeline never awaits; a background worker drains it and
//! forwards to the out-of-band review queue. A closed channel drops the
//! event rather than failing the request.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::value_objects::SessionId;

/// Which medium a placeholder event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetMedium {
    Image,
    Audio,
}

/// An event queued for out-of-band human review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// Content passed with a flag verdict at some checkpoint
    ContentFlagged {
        session_id: SessionId,
        reasons: Vec<String>,
    },
    /// An asset degraded to a placeholder
    PlaceholderAsset {
        session_id: SessionId,
        medium: AssetMedium,
        reference: String,
    },
}

/// Sending half of the review channel, cloned into the pipeline
#[derive(Debug, Clone)]
pub struct ReviewQueue {
    tx: UnboundedSender<ReviewEvent>,
}

impl ReviewQueue {
    /// Create the queue and the receiver its worker drains
    pub fn new() -> (Self, UnboundedReceiver<ReviewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event without awaiting delivery
    pub fn publish(&self, event: ReviewEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("review channel closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_published_events_reach_the_receiver() {
        let (queue, mut rx) = ReviewQueue::new();
        let session_id = SessionId::new();

        queue.publish(ReviewEvent::ContentFlagged {
            session_id,
            reasons: vec!["flagged term \"storm\"".to_string()],
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ReviewEvent::ContentFlagged { .. }));
    }

    #[tokio::test]
    async fn test_publish_to_closed_channel_does_not_panic() {
        let (queue, rx) = ReviewQueue::new();
        drop(rx);
        queue.publish(ReviewEvent::PlaceholderAsset {
            session_id: SessionId::new(),
            medium: AssetMedium::Audio,
            reference: "file:///var/media/narration.wav".to_string(),
        });
    }
}
