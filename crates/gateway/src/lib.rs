//! HTTP gateway for RallyCoach.
//!
//! - `GET /health`: liveness and version
//! - `POST /chat`: run one turn for a session
//! - `POST /new-chat`: reset a session
//!
//! Built on Axum; every route shares one [`ChatEngine`].

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, warn};

use rallycoach_config::AppConfig;
use rallycoach_core::event::DomainEvent;
use rallycoach_core::index::VectorIndex;
use rallycoach_engine::ChatEngine;
use rallycoach_retrieval::PassageIndex;

/// Session id used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ChatEngine>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS: any origin when `cors_origins` is empty, otherwise exactly those
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/new-chat", post(new_chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Build the engine and its collaborators from configuration.
///
/// Opens the passage index at `config.index.path`; an empty index is allowed
/// (every turn then runs without reference material).
pub async fn build_engine(config: &AppConfig) -> Result<Arc<ChatEngine>, Box<dyn std::error::Error>> {
    let router = rallycoach_providers::build_from_config(config);
    let chat_provider = router
        .default()
        .ok_or_else(|| format!("No provider named '{}' configured", config.default_provider))?;
    let embedding_provider = router
        .get(config.embedding_provider_name())
        .ok_or_else(|| {
            format!(
                "No provider named '{}' configured",
                config.embedding_provider_name()
            )
        })?;

    let index = PassageIndex::open(&config.index.path);
    let passages = index.count().await?;
    if passages == 0 {
        warn!(
            path = %config.index.path.display(),
            "Passage index is empty; run `rallycoach ingest <FILE>` to add reference material"
        );
    } else {
        info!(passages, "Passage index ready");
    }

    Ok(Arc::new(ChatEngine::from_config(
        config,
        chat_provider,
        embedding_provider,
        Arc::new(index),
    )))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let engine = build_engine(&config).await?;
    tokio::spawn(log_events(engine.event_bus().subscribe()));
    let state = Arc::new(GatewayState { engine });
    let app = build_router(state, &config.gateway.cors_origins);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Trace every engine event until the bus closes. Returns how many were seen.
async fn log_events(mut events: broadcast::Receiver<Arc<DomainEvent>>) -> usize {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                seen += 1;
                match event.as_ref() {
                    DomainEvent::RetrievalDegraded { session_id, .. } => {
                        debug!(session_id = %session_id, "Event: retrieval degraded")
                    }
                    DomainEvent::CompletionFailed { session_id, .. } => {
                        debug!(session_id = %session_id, "Event: completion failed")
                    }
                    DomainEvent::TurnCompleted {
                        session_id,
                        history_len,
                        ..
                    } => debug!(session_id = %session_id, history_len, "Event: turn completed"),
                    DomainEvent::SessionReset {
                        session_id,
                        existed,
                        ..
                    } => debug!(session_id = %session_id, existed, "Event: session reset"),
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
    seen
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Missing and `null` fields are treated alike.
#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Run one turn. A missing, `null`, empty or whitespace-only message is
/// rejected with 400; whitespace alone never reaches the model.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let message = payload.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No message provided".into(),
            }),
        ));
    }

    let session_id = payload
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    info!(session_id = %session_id, "Chat request");
    let response = state.engine.handle_turn(&session_id, &message).await;

    Ok(Json(ChatResponse { response }))
}

#[derive(Deserialize)]
struct NewChatRequest {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct NewChatResponse {
    status: &'static str,
}

async fn new_chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<NewChatRequest>,
) -> Json<NewChatResponse> {
    let session_id = payload.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID);
    state.engine.reset_session(session_id).await;
    Json(NewChatResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use rallycoach_core::error::{IndexError, ProviderError};
    use rallycoach_core::message::{Message, Role};
    use rallycoach_core::provider::{
        EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    };
    use rallycoach_engine::{APOLOGY, EngineSettings, Retriever};

    /// Echoes the latest user message; embeddings are constant.
    struct EchoProvider {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            if self.fail {
                return Err(ProviderError::Timeout("120s".into()));
            }
            let last = request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ProviderResponse {
                message: Message::assistant(format!("Coach says: {last}.")),
                usage: None,
                model: request.model,
            })
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|_| vec![1.0, 0.0]).collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    struct EmptyIndex;

    #[async_trait::async_trait]
    impl VectorIndex for EmptyIndex {
        fn name(&self) -> &str {
            "empty"
        }

        async fn query(&self, _embedding: &[f32], _k: usize) -> Result<Vec<String>, IndexError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<usize, IndexError> {
            Ok(0)
        }
    }

    fn test_state(fail: bool) -> SharedState {
        let provider: Arc<dyn Provider> = Arc::new(EchoProvider { fail });
        let retriever = Retriever::new(provider.clone(), "embed", Arc::new(EmptyIndex), 5);
        let engine = ChatEngine::new(provider, retriever, EngineSettings::default());
        Arc::new(GatewayState {
            engine: Arc::new(engine),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(false), &[]);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn chat_returns_response() {
        let app = build_router(test_state(false), &[]);

        let response = app
            .oneshot(post_json(
                "/chat",
                r#"{"message":"How do I stay calm?","session_id":"abc"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], "Coach says: How do I stay calm?.");
    }

    #[tokio::test]
    async fn chat_without_session_uses_default() {
        let state = test_state(false);
        let app = build_router(state.clone(), &[]);

        let response = app
            .oneshot(post_json("/chat", r#"{"message":"hi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let session = state.engine.sessions().snapshot(DEFAULT_SESSION_ID).await;
        assert_eq!(session.unwrap().history.len(), 2);
    }

    #[tokio::test]
    async fn chat_rejects_empty_message() {
        let state = test_state(false);

        for body in [
            r#"{"message":""}"#,
            r#"{"session_id":"x"}"#,
            r#"{"message":"   "}"#,
            r#"{"message":null}"#,
            r#"{"message":null,"session_id":"x"}"#,
        ] {
            let app = build_router(state.clone(), &[]);
            let response = app.oneshot(post_json("/chat", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"], "No message provided");
        }

        assert!(state.engine.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn null_session_id_uses_default() {
        let state = test_state(false);

        let app = build_router(state.clone(), &[]);
        let response = app
            .oneshot(post_json("/chat", r#"{"message":"hi","session_id":null}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.engine.sessions().snapshot(DEFAULT_SESSION_ID).await.is_some());

        let app = build_router(state.clone(), &[]);
        let response = app
            .oneshot(post_json("/new-chat", r#"{"session_id":null}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.engine.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn event_log_drains_until_bus_closes() {
        let state = test_state(false);
        let events = state.engine.event_bus().subscribe();
        let logger = tokio::spawn(log_events(events));

        let app = build_router(state.clone(), &[]);
        app.oneshot(post_json("/chat", r#"{"message":"hi","session_id":"s1"}"#))
            .await
            .unwrap();
        state.engine.reset_session("s1").await;

        // Dropping the last engine handle closes the bus
        drop(state);
        assert_eq!(logger.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn chat_completion_failure_is_still_ok() {
        let app = build_router(test_state(true), &[]);

        let response = app
            .oneshot(post_json("/chat", r#"{"message":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"], APOLOGY);
    }

    #[tokio::test]
    async fn new_chat_resets_session() {
        let state = test_state(false);

        let app = build_router(state.clone(), &[]);
        app.oneshot(post_json("/chat", r#"{"message":"hi","session_id":"s1"}"#))
            .await
            .unwrap();
        assert!(state.engine.sessions().snapshot("s1").await.is_some());

        let app = build_router(state.clone(), &[]);
        let response = app
            .oneshot(post_json("/new-chat", r#"{"session_id":"s1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
        assert!(state.engine.sessions().snapshot("s1").await.is_none());
    }

    #[tokio::test]
    async fn new_chat_for_unknown_session_is_ok() {
        let app = build_router(test_state(false), &[]);
        let response = app.oneshot(post_json("/new-chat", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_state(false), &[]);
        let huge = format!(r#"{{"message":"{}"}}"#, "a".repeat(2 * 1024 * 1024));

        let response = app.oneshot(post_json("/chat", &huge)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn configured_cors_origin_is_echoed() {
        let origins = vec!["http://localhost:5173".to_string()];
        let app = build_router(test_state(false), &origins);

        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn build_engine_with_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.index.path = dir.path().join("passages.jsonl");

        let engine = build_engine(&config).await.unwrap();
        assert_eq!(engine.settings().first_turn_max_tokens, 400);
    }
}
