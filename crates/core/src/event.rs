//! Domain event system: decoupled notifications about chat turns.
//!
//! The engine publishes an event whenever a turn finishes, degrades, or a
//! session is reset. Front ends and tests subscribe without coupling to the
//! engine internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn finished and the answer was recorded in history
    TurnCompleted {
        session_id: String,
        passages: usize,
        max_tokens: u32,
        history_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// Embedding or index lookup failed; the turn ran without reference material
    RetrievalDegraded {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The completion call failed and the apology was used instead
    CompletionFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was explicitly reset
    SessionReset {
        session_id: String,
        existed: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
