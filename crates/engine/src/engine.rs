//! Turn orchestration.
//!
//! [`ChatEngine::handle_turn`] never fails: retrieval faults degrade to a
//! turn without reference material, completion faults become [`APOLOGY`].
//! Both are logged and published on the event bus.

use std::sync::Arc;

use chrono::Utc;
use rallycoach_config::AppConfig;
use rallycoach_core::event::{DomainEvent, EventBus};
use rallycoach_core::index::VectorIndex;
use rallycoach_core::message::Message;
use rallycoach_core::provider::{Provider, ProviderRequest};
use tracing::{debug, error, info, warn};

use crate::postprocess::trim_incomplete_sentence;
use crate::prompt::ContextAssembler;
use crate::retriever::{PASSAGE_SEPARATOR, Retriever};
use crate::session::SessionStore;

/// Assistant content used when the completion call fails.
pub const APOLOGY: &str = "I'm sorry, I'm having trouble right now. Please try again.";

/// Per-turn knobs for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub chat_model: String,
    pub temperature: f32,
    /// History entries kept after each turn.
    pub history_limit: usize,
    /// Token budget while the key-concepts latch is unset.
    pub first_turn_max_tokens: u32,
    pub followup_max_tokens: u32,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chat_model: config.chat_model.clone(),
            temperature: config.temperature,
            history_limit: config.engine.history_limit,
            first_turn_max_tokens: config.engine.first_turn_max_tokens,
            followup_max_tokens: config.engine.followup_max_tokens,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Runs conversational turns against per-session state.
pub struct ChatEngine {
    provider: Arc<dyn Provider>,
    retriever: Retriever,
    assembler: ContextAssembler,
    sessions: SessionStore,
    settings: EngineSettings,
    event_bus: Arc<EventBus>,
}

impl ChatEngine {
    pub fn new(provider: Arc<dyn Provider>, retriever: Retriever, settings: EngineSettings) -> Self {
        Self {
            provider,
            retriever,
            assembler: ContextAssembler::default(),
            sessions: SessionStore::new(),
            settings,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Wire an engine from configuration and already-built collaborators.
    pub fn from_config(
        config: &AppConfig,
        chat_provider: Arc<dyn Provider>,
        embedding_provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let retriever = Retriever::new(
            embedding_provider,
            &config.embedding_model,
            index,
            config.engine.top_k,
        );
        let assembler = match &config.engine.persona_override {
            Some(persona) => ContextAssembler::new(persona.clone()),
            None => ContextAssembler::default(),
        };

        Self::new(chat_provider, retriever, EngineSettings::from_config(config))
            .with_assembler(assembler)
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Run one question/answer exchange and return the assistant's reply.
    ///
    /// `question` is assumed non-empty; callers reject blank input. Turns on
    /// the same session are serialized.
    pub async fn handle_turn(&self, session_id: &str, question: &str) -> String {
        let handle = self.sessions.get_or_create(session_id).await;
        let mut session = handle.lock().await;

        let passages = match self.retriever.retrieve(question).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(session_id, error = %e, "Retrieval failed, continuing without reference material");
                self.event_bus.publish(DomainEvent::RetrievalDegraded {
                    session_id: session_id.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Vec::new()
            }
        };
        let context = passages.join(PASSAGE_SEPARATOR);

        let first_turn = !session.explained_key_concepts;
        let system_content = self.assembler.assemble(&context, first_turn);

        // The history is only written once the turn has an answer, so a
        // dropped turn leaves the session untouched.
        let user_message = Message::user(question);
        let mut messages = Vec::with_capacity(session.history.len() + 2);
        messages.push(Message::system(system_content));
        messages.extend(session.history.iter().cloned());
        messages.push(user_message.clone());

        let max_tokens = if first_turn {
            self.settings.first_turn_max_tokens
        } else {
            self.settings.followup_max_tokens
        };

        debug!(
            session_id,
            passages = passages.len(),
            messages = messages.len(),
            max_tokens,
            "Requesting completion"
        );

        let request = ProviderRequest {
            model: self.settings.chat_model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: Some(max_tokens),
        };

        let raw = match self.provider.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                error!(session_id, error = %e, "Completion failed");
                self.event_bus.publish(DomainEvent::CompletionFailed {
                    session_id: session_id.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                APOLOGY.to_string()
            }
        };
        let answer = trim_incomplete_sentence(&raw).to_string();

        session.explained_key_concepts = true;
        session.history.push(user_message);
        session.history.push(Message::assistant(answer.clone()));
        session.truncate_history(self.settings.history_limit);

        let history_len = session.history.len();
        drop(session);

        info!(
            session_id,
            passages = passages.len(),
            max_tokens,
            history_len,
            "Turn completed"
        );
        self.event_bus.publish(DomainEvent::TurnCompleted {
            session_id: session_id.to_string(),
            passages: passages.len(),
            max_tokens,
            history_len,
            timestamp: Utc::now(),
        });

        answer
    }

    /// Forget everything about `session_id`. Absent sessions are fine.
    pub async fn reset_session(&self, session_id: &str) {
        let existed = self.sessions.delete(session_id).await;
        info!(session_id, existed, "Session reset");
        self.event_bus.publish(DomainEvent::SessionReset {
            session_id: session_id.to_string(),
            existed,
            timestamp: Utc::now(),
        });
    }
}
