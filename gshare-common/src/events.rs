//! Transfer lifecycle events and EventBus
//!
//! Every listener callback of a share session can be mirrored onto the
//! EventBus as a `ShareEvent`, so any number of consumers (CLI progress
//! output, tests, a UI bridge) can observe transfers without registering
//! their own listener.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Share lifecycle events
///
/// Serialized with a `type` tag so they can be forwarded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShareEvent {
    /// Permission granted, worker about to start
    TransferStarted {
        /// Source file path as passed by the caller
        path: String,
        timestamp: DateTime<Utc>,
    },

    /// Permission request resolved to denied; nothing was written
    TransferDenied {
        path: String,
        timestamp: DateTime<Utc>,
    },

    /// Display name already indexed; nothing was written
    TransferSkipped {
        path: String,
        timestamp: DateTime<Utc>,
    },

    /// Worker finished (error is None on success)
    TransferEnded {
        path: String,
        /// Error kind name, e.g. "SourceMissing"
        error_kind: Option<String>,
        /// Human readable error message
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl ShareEvent {
    /// Source path the event refers to
    pub fn path(&self) -> &str {
        match self {
            ShareEvent::TransferStarted { path, .. }
            | ShareEvent::TransferDenied { path, .. }
            | ShareEvent::TransferSkipped { path, .. }
            | ShareEvent::TransferEnded { path, .. } => path,
        }
    }

    /// True for events that close a transfer
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ShareEvent::TransferStarted { .. })
    }
}

/// Broadcast channel for ShareEvents
///
/// Cheap to clone; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ShareEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per slow subscriber
    /// before the oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ShareEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ShareEvent,
    ) -> Result<usize, broadcast::error::SendError<ShareEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ShareEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let sent = bus
            .emit(ShareEvent::TransferStarted {
                path: "/tmp/photo.jpg".to_string(),
                timestamp: Utc::now(),
            })
            .unwrap();
        assert_eq!(sent, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.path(), "/tmp/photo.jpg");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        let result = bus.emit(ShareEvent::TransferDenied {
            path: "/tmp/photo.jpg".to_string(),
            timestamp: Utc::now(),
        });
        assert!(result.is_err());

        // Lossy variant never fails
        bus.emit_lossy(ShareEvent::TransferSkipped {
            path: "/tmp/photo.jpg".to_string(),
            timestamp: Utc::now(),
        });
        assert_eq!(bus.capacity(), 10);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ShareEvent::TransferEnded {
            path: "/tmp/photo.jpg".to_string(),
            error_kind: Some("SourceMissing".to_string()),
            error: Some("Source file not found: /tmp/photo.jpg".to_string()),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TransferEnded");
        assert_eq!(json["error_kind"], "SourceMissing");

        let parsed: ShareEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
        assert!(parsed.is_terminal());
    }
}
