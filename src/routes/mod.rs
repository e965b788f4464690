//! API routes

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::store::PUBLIC_SESSION;
use crate::core::RelayError;
use crate::portfolio;
use crate::AppState;

/// Uploaded resume text must carry at least this many characters after
/// trimming.
const MIN_RESUME_CHARS: usize = 50;

/// JSON error payload with a status code. Every failure path in the service
/// ends here; nothing propagates past the endpoint boundary.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::EmptyMessage | RelayError::SessionMissing => {
                ApiError::bad_request(err.to_string())
            }
            RelayError::ProviderUnreachable => ApiError::internal(err.to_string()),
            RelayError::Store(err) => {
                tracing::error!("Store error: {err}");
                ApiError::internal(err.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatMessageRequest {
    message: String,
    #[serde(default = "default_session")]
    session: String,
}

#[derive(Debug, Deserialize)]
struct ResetParams {
    #[serde(default = "default_session")]
    session: String,
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    resume_text: String,
    #[serde(default)]
    owner: Option<String>,
}

fn default_session() -> String {
    PUBLIC_SESSION.to_string()
}

/// GET / - portfolio profile data the landing page renders from.
async fn portfolio_page() -> Json<Value> {
    Json(portfolio::profile())
}

/// GET /public - confirm the public chat session is usable.
async fn public_chat(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let has_resume = state
        .store
        .get(PUBLIC_SESSION)
        .is_some_and(|record| !record.resume_text.is_empty());

    if !has_resume {
        return Err(ApiError::bad_request(
            "Resume not found. Please ensure the resume file exists.",
        ));
    }

    Ok(Json(json!({ "session": PUBLIC_SESSION })))
}

/// POST /chat/message - buffered chat exchange.
async fn chat_message(
    State(state): State<AppState>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state.relay.chat(&req.session, &req.message).await?;
    Ok(Json(json!({ "response": response })))
}

/// POST /chat/stream - incremental chat exchange over SSE.
async fn chat_stream(
    State(state): State<AppState>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let events = state.relay.chat_stream(&req.session, &req.message)?;
    let stream = events.map(|event| Event::default().json_data(&event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /reset - empty the transcript; the resume text is kept.
async fn reset(State(state): State<AppState>, Query(params): Query<ResetParams>) -> Json<Value> {
    if let Err(err) = state.store.reset_transcript(&params.session) {
        tracing::debug!("Reset for missing session: {err}");
    }
    Json(json!({ "success": true }))
}

/// GET /health - service status plus a live provider probe.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "api_configured": state.client.is_configured(),
        "active_sessions": state.store.len(),
        "api_test": state.client.probe().await,
    }))
}

/// POST /upload - store a new resume under a fresh session key.
async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UploadRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.credentials.enabled() {
        return Err(ApiError::forbidden("Upload disabled"));
    }

    let authorized = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| state.credentials.authorize(token));

    if !authorized {
        return Err(ApiError::forbidden("Invalid upload credentials"));
    }

    let resume_text = req.resume_text.trim();
    if resume_text.chars().count() < MIN_RESUME_CHARS {
        return Err(ApiError::bad_request(format!(
            "Resume text must be at least {MIN_RESUME_CHARS} characters"
        )));
    }

    let session = Uuid::new_v4().to_string();
    let owner = req.owner.as_deref().unwrap_or("upload");
    state.store.put(&session, resume_text, owner);
    tracing::info!("Resume uploaded for session {session} ({} chars)", resume_text.len());

    Ok(Json(json!({ "session": session })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(portfolio_page))
        .route("/public", get(public_chat))
        .route("/chat/message", post(chat_message))
        .route("/chat/stream", post(chat_stream))
        .route("/reset", get(reset))
        .route("/health", get(health))
        .route("/upload", post(upload))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::providers::deepseek::AUTH_ISSUE_TEXT;

    const RESUME: &str = "A resume describing ten years of backend and data systems work.";

    fn test_config(api_url: &str) -> Config {
        Config {
            host: "127.0.0.1".into(),
            port: 0,
            api_key: Some("test-key".into()),
            api_url: api_url.into(),
            resume_file: "unused".into(),
            secret_key: Some("s3cret".into()),
            retry_attempts: 3,
            retry_base: Duration::from_millis(1),
        }
    }

    fn app_for(config: Config) -> (Router, AppState) {
        let state = AppState::new(config);
        state.store.put(PUBLIC_SESSION, RESUME, "system");
        let app = router().with_state(state.clone());
        (app, state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_provider_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;
        let (app, _state) = app_for(test_config(&server.url()));

        for uri in ["/chat/message", "/chat/stream"] {
            let response = app
                .clone()
                .oneshot(post_json(uri, json!({ "message": "   " })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = read_json(response).await;
            assert_eq!(body["error"], "Please provide a message");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_session_returns_400() {
        let (app, _state) = app_for(test_config("http://127.0.0.1:1"));
        let response = app
            .oneshot(post_json(
                "/chat/message",
                json!({ "message": "hi", "session": "ghost" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "No active session. Please access the chat properly.");
    }

    #[tokio::test]
    async fn degraded_provider_is_a_successful_exchange() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(401)
            .create_async()
            .await;
        let (app, state) = app_for(test_config(&server.url()));

        let response = app
            .oneshot(post_json("/chat/message", json!({ "message": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["response"], AUTH_ISSUE_TEXT);

        let transcript = state.store.get(PUBLIC_SESSION).unwrap().transcript;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].ai_response, AUTH_ISSUE_TEXT);
    }

    #[tokio::test]
    async fn unreachable_provider_returns_500_without_transcript_mutation() {
        let (app, state) = app_for(test_config("http://127.0.0.1:1"));

        let response = app
            .oneshot(post_json("/chat/message", json!({ "message": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(
            body["error"],
            "Failed to get AI response. Please check your internet connection and try again."
        );
        assert!(state.store.get(PUBLIC_SESSION).unwrap().transcript.is_empty());
    }

    #[tokio::test]
    async fn stream_endpoint_emits_chunk_and_complete_events() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
                "data: [DONE]\n\n",
            ))
            .create_async()
            .await;
        let (app, state) = app_for(test_config(&server.url()));

        let response = app
            .oneshot(post_json("/chat/stream", json!({ "message": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/event-stream"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains(r#"{"type":"chunk","chunk":"Hi"}"#));
        assert!(body.contains(r#"{"type":"chunk","chunk":" there"}"#));
        assert!(body.contains(r#"{"type":"complete","full_response":"Hi there"}"#));

        let transcript = state.store.get(PUBLIC_SESSION).unwrap().transcript;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].ai_response, "Hi there");
    }

    #[tokio::test]
    async fn upload_enforces_minimum_resume_length() {
        let (app, state) = app_for(test_config("http://127.0.0.1:1"));

        let short = "x".repeat(49);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::from(json!({ "resume_text": short }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let exact = "x".repeat(50);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::from(json!({ "resume_text": exact }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let session = body["session"].as_str().unwrap();
        assert!(state.store.contains(session));
    }

    #[tokio::test]
    async fn upload_requires_valid_credentials() {
        let (app, _state) = app_for(test_config("http://127.0.0.1:1"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer wrong")
                    .body(Body::from(
                        json!({ "resume_text": "x".repeat(50) }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let mut config = test_config("http://127.0.0.1:1");
        config.secret_key = None;
        let (app, _state) = app_for(config);
        let response = app
            .oneshot(post_json("/upload", json!({ "resume_text": "x".repeat(50) })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Upload disabled");
    }

    #[tokio::test]
    async fn reset_clears_transcript_and_keeps_resume() {
        let (app, state) = app_for(test_config("http://127.0.0.1:1"));
        state
            .store
            .append_exchange(PUBLIC_SESSION, "q", "a")
            .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);

        let record = state.store.get(PUBLIC_SESSION).unwrap();
        assert!(record.transcript.is_empty());
        assert_eq!(record.resume_text, RESUME);
    }

    #[tokio::test]
    async fn health_reports_unconfigured_api() {
        let mut config = test_config("http://127.0.0.1:1");
        config.api_key = None;
        let (app, _state) = app_for(config);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["api_configured"], false);
        assert_eq!(body["api_test"], "not_configured");
        assert_eq!(body["active_sessions"], 1);
    }

    #[tokio::test]
    async fn health_probes_configured_api() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let (app, _state) = app_for(test_config(&server.url()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["api_configured"], true);
        assert_eq!(body["api_test"], "success");
    }

    #[tokio::test]
    async fn public_chat_requires_a_loaded_resume() {
        let (app, _state) = app_for(test_config("http://127.0.0.1:1"));
        let response = app
            .oneshot(Request::builder().uri("/public").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["session"], PUBLIC_SESSION);

        // No seeded resume at all.
        let state = AppState::new(test_config("http://127.0.0.1:1"));
        let app = router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/public").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn portfolio_serves_profile_data() {
        let (app, _state) = app_for(test_config("http://127.0.0.1:1"));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert!(body["name"].is_string());
        assert!(body["skills"].is_array());
    }
}
