//! Session store: per-id conversation state.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, so a turn holds
//! its session for the whole exchange while turns on other sessions run
//! freely. The map itself is only write-locked to insert or remove.

use std::collections::HashMap;
use std::sync::Arc;

use rallycoach_core::message::Message;
use tokio::sync::{Mutex, RwLock};

/// One user's ongoing conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// User/assistant messages, oldest first.
    pub history: Vec<Message>,

    /// Set after the first reply; never cleared except by deleting the session.
    pub explained_key_concepts: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the most recent `limit` messages.
    pub fn truncate_history(&mut self, limit: usize) {
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

/// Process-wide mapping from session id to session.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `session_id`, creating an empty one if absent.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Drop the session for `session_id`. Returns whether it existed.
    ///
    /// A turn already holding the old session finishes against it; the next
    /// turn for the id starts fresh.
    pub async fn delete(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// A copy of the current state, waiting for any in-flight turn.
    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        let session = self.sessions.read().await.get(session_id).cloned()?;
        let guard = session.lock().await;
        Some(guard.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
