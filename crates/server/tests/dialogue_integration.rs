//! Integration tests for the dialogue endpoints.
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against a scripted
//! upstream provider, so no network calls are made.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use agora_core::config::ServerConfig;
use agora_core::persona;
use agora_llm::provider::mock::MockChatProvider;
use agora_llm::{Message, Role};
use agora_server::{build_router, AppState};

// ── Helpers ──────────────────────────────────────────────────────

fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

fn app(provider: Arc<MockChatProvider>) -> Router {
    let state = Arc::new(AppState::new(provider, Duration::ZERO));
    build_router(state, &server_config())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post(app: Router, uri: &str, body: impl Into<String>) -> (StatusCode, HeaderMap, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    send(app, request).await
}

// ── Streaming ────────────────────────────────────────────────────

#[tokio::test]
async fn start_streams_fragments_then_done() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["Hel", "lo", ""]));
    let body = json!({"figure": "Aristotle", "mode": "socratic", "topic": "justice"});

    let (status, headers, text) = post(app(provider.clone()), "/start", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::CONNECTION], "keep-alive");
    assert_eq!(text, "data: \"Hel\"\n\ndata: \"lo\"\n\ndata: [DONE]\n\n");
    assert_eq!(provider.call_count(), 1);
    assert_eq!(provider.live_streams(), 0);
}

#[tokio::test]
async fn fragments_are_json_encoded() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["line one\nline \"two\""]));
    let body = json!({"figure": "Confucius", "mode": "lesson", "topic": "ritual"});

    let (_, _, text) = post(app(provider), "/start", body.to_string()).await;

    assert_eq!(
        text,
        "data: \"line one\\nline \\\"two\\\"\"\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn mid_stream_error_still_ends_with_done() {
    let provider = Arc::new(MockChatProvider::with_error_after(&["partial"], "reset"));
    let body = json!({"figure": "Cleopatra", "mode": "lesson", "topic": "Egypt"});

    let (status, _, text) = post(app(provider.clone()), "/start", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "data: \"partial\"\n\ndata: [DONE]\n\n");
    assert_eq!(text.matches("[DONE]").count(), 1);
    assert_eq!(provider.live_streams(), 0);
}

#[tokio::test]
async fn upstream_open_failure_is_500() {
    let provider = Arc::new(MockChatProvider::failing_open(401, "bad key"));
    let body = json!({"figure": "Confucius", "mode": "lesson", "topic": "ritual"});

    let (status, headers, text) = post(app(provider.clone()), "/start", body.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json, json!({"error": "Error creating stream"}));
    assert_eq!(provider.call_count(), 1);
}

// ── Validation ───────────────────────────────────────────────────

#[tokio::test]
async fn malformed_json_is_400_and_upstream_untouched() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["never"]));

    let (status, headers, text) =
        post(app(provider.clone()), "/continue", r#"{"message": "hi", "messages": ["#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(!text.contains("data:"));
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json, json!({"error": "Invalid request"}));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn wrong_shape_is_400() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["never"]));
    // `messages` must be a list.
    let body = json!({"message": "hi", "messages": "hi", "mode": "lesson", "figure": "Cleopatra"});

    let (status, _, _) = post(app(provider.clone()), "/continue", body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn start_without_mode_uses_epilogue_only() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["ok"]));

    let (status, _, _) = post(
        app(provider.clone()),
        "/start",
        json!({"figure": "Aristotle"}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        provider.calls()[0],
        vec![Message::system(persona::epilogue("Aristotle"))]
    );
}

#[tokio::test]
async fn continue_tolerates_missing_and_null_fields() {
    let bodies = [
        // No `message`.
        json!({"messages": [{"role": "user", "content": "hi"}], "mode": "lesson", "figure": "Cleopatra"}),
        json!({"message": "hi", "messages": null, "mode": "lesson", "figure": "Cleopatra"}),
        json!({"message": "hi", "mode": "lesson", "figure": "Cleopatra"}),
        // History entry without `content`.
        json!({"message": "hi", "messages": [{"role": "user"}], "mode": "lesson", "figure": "Cleopatra"}),
    ];

    for body in bodies {
        let provider = Arc::new(MockChatProvider::with_deltas(&["ok"]));
        let (status, _, text) = post(app(provider.clone()), "/continue", body.to_string()).await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(text, "data: \"ok\"\n\ndata: [DONE]\n\n");
        assert_eq!(provider.call_count(), 1, "body: {body}");
    }
}

#[tokio::test]
async fn null_history_sends_only_system_prompt() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let body = json!({"message": "hi", "messages": null, "mode": "lesson", "figure": "Cleopatra", "topic": "Egypt"});

    post(app(provider.clone()), "/continue", body.to_string()).await;

    let calls = provider.calls();
    assert_eq!(calls[0].len(), 1);
    assert_eq!(calls[0][0].role, Role::System);
}

#[tokio::test]
async fn history_entry_without_content_is_forwarded_empty() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let body = json!({"messages": [{"role": "user"}], "mode": "lesson", "figure": "Cleopatra"});

    post(app(provider.clone()), "/continue", body.to_string()).await;

    assert_eq!(provider.calls()[0][1], Message::user(""));
}

#[tokio::test]
async fn both_figure_spellings_prefer_figure() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let body = json!({
        "messages": [],
        "mode": "humor",
        "figure": "El Arroyo Sign",
        "selectedFigure": "Charles Darwin"
    });

    let (status, _, _) = post(app(provider.clone()), "/api/chat", body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(provider.calls()[0][0]
        .content
        .ends_with(&persona::epilogue("El Arroyo Sign")));
}

#[tokio::test]
async fn missing_content_type_is_400() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["never"]));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/start")
        .body(Body::from(
            json!({"figure": "Aristotle", "mode": "socratic", "topic": "justice"}).to_string(),
        ))
        .unwrap();

    let (status, _, _) = send(app(provider.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

// ── Prompt assembly ──────────────────────────────────────────────

#[tokio::test]
async fn continue_prepends_persona_prompt_to_history() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["Indeed."]));
    let body = json!({
        "message": "Is justice fairness?",
        "messages": [
            {"role": "assistant", "content": "Greetings, I am Aristotle."},
            {"role": "user", "content": "Is justice fairness?", "name": "Ada"}
        ],
        "mode": "socratic",
        "figure": "Aristotle",
        "topic": "justice"
    });

    let (status, _, _) = post(app(provider.clone()), "/continue", body.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let sent = &calls[0];
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].role, Role::System);
    assert!(sent[0].content.contains("Socratic dialogue about \"justice\""));
    assert!(sent[0].content.ends_with(&persona::epilogue("Aristotle")));
    assert_eq!(sent[1], Message::assistant("Greetings, I am Aristotle."));
    assert_eq!(sent[2], Message::user("Is justice fairness?"));
}

#[tokio::test]
async fn start_unknown_figure_uses_generic_prompt() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let body = json!({"figure": "Zeno of Citium", "mode": "anything"});

    let (status, _, text) = post(app(provider.clone()), "/start", body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "data: [DONE]\n\n");

    let calls = provider.calls();
    assert_eq!(
        calls[0],
        vec![Message::system(persona::compose("Zeno of Citium", "anything", None))]
    );
    assert!(calls[0][0]
        .content
        .starts_with("You are Zeno of Citium. Engage in a meaningful conversation with the user."));
}

#[tokio::test]
async fn original_client_paths_and_fields() {
    let provider = Arc::new(MockChatProvider::with_deltas(&["ok"]));
    let body = json!({
        "message": "hello",
        "messages": [{"role": "user", "content": "hello"}],
        "mode": "humor",
        "selectedFigure": "El Arroyo Sign",
        "selectedTopic": "traffic"
    });

    let (status, _, text) = post(app(provider.clone()), "/api/chat", body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "data: \"ok\"\n\ndata: [DONE]\n\n");
    assert!(provider.calls()[0][0].content.contains("message about \"traffic\""));

    let start = json!({"figure": "Albert Einstein", "mode": "lesson", "topic": "relativity"});
    let (status, _, _) = post(app(provider.clone()), "/api/start-dialogue", start.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.call_count(), 2);
}

// ── Health & CORS ────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_model_and_figures() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, _, text) = send(app(provider), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["provider"], "mock");
    assert_eq!(json["model"], "mock-model");
    assert_eq!(json["figures"].as_array().unwrap().len(), persona::figures().len());
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/start")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = send(app(provider), request).await;

    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn cors_rejects_unknown_origin() {
    let provider = Arc::new(MockChatProvider::with_deltas(&[]));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/start")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = send(app(provider), request).await;

    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
