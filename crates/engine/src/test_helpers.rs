//! Shared test doubles for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rallycoach_core::error::{IndexError, ProviderError};
use rallycoach_core::index::VectorIndex;
use rallycoach_core::message::{Message, Role};
use rallycoach_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};

#[derive(Clone, Copy)]
enum EmbedMode {
    Ok,
    Fail,
    Empty,
}

/// A provider with scripted completions.
///
/// Each `complete` call returns the next scripted reply; once the script
/// runs out it echoes the latest user message as `"You said: <msg>."`.
/// Every request is recorded for inspection.
pub struct MockProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
    fail_completion: bool,
    embed_mode: EmbedMode,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fail_completion: false,
            embed_mode: EmbedMode::Ok,
            delay: None,
        }
    }

    pub fn with_replies(self, replies: &[&str]) -> Self {
        *self.replies.lock().unwrap() = replies.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_completion_failure(mut self) -> Self {
        self.fail_completion = true;
        self
    }

    pub fn with_embedding_failure(mut self) -> Self {
        self.embed_mode = EmbedMode::Fail;
        self
    }

    pub fn with_empty_embeddings(mut self) -> Self {
        self.embed_mode = EmbedMode::Empty;
        self
    }

    /// Sleep inside `complete` so concurrent turns get a chance to interleave.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn completion_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_completion {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "upstream exploded".into(),
            });
        }

        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("You said: {last_user}."));

        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        match self.embed_mode {
            EmbedMode::Fail => Err(ProviderError::Network("connection reset".into())),
            EmbedMode::Empty => Ok(EmbeddingResponse {
                embeddings: Vec::new(),
                model: request.model,
                usage: None,
            }),
            EmbedMode::Ok => Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|_| vec![0.1, 0.2, 0.3]).collect(),
                model: request.model,
                usage: None,
            }),
        }
    }
}

/// An index that returns its passages in insertion order.
pub struct StubIndex {
    passages: Vec<String>,
    fail: bool,
    last_k: Mutex<Option<usize>>,
}

impl StubIndex {
    pub fn with_passages(passages: &[&str]) -> Self {
        Self {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            fail: false,
            last_k: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            passages: Vec::new(),
            fail: true,
            last_k: Mutex::new(None),
        }
    }

    pub fn last_k(&self) -> Option<usize> {
        *self.last_k.lock().unwrap()
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    fn name(&self) -> &str {
        "stub"
    }

    async fn query(&self, _embedding: &[f32], k: usize) -> Result<Vec<String>, IndexError> {
        *self.last_k.lock().unwrap() = Some(k);
        if self.fail {
            return Err(IndexError::QueryFailed("collection missing".into()));
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.passages.len())
    }
}
