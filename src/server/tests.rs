use super::*;
use crate::config::GatewayConfig;
use crate::inference::InferenceClient;
use crate::subprocess::{MockProcessRunner, ProcessRunner};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const BINARY: &str = "/opt/litert/litert_lm_main";

fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.inference.binary_path = PathBuf::from(BINARY);
    config.inference.model_path = PathBuf::from("/models/gemma3-1b.litertlm");
    config.streaming.interval = Duration::ZERO;
    config.streaming.chunk_words = 2;
    config
}

fn router_with(mock: &MockProcessRunner, config: GatewayConfig) -> Router {
    let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
    let client = InferenceClient::new(runner, config.inference.clone());
    build_router(AppState::new(client, Arc::new(config)))
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn paris_mock() -> MockProcessRunner {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stdout(
            "I0001 00:00:00 loading model\nResponse: Paris is the capital of France.\nBenchmarkInfo:\nPrefill: 120.5 tokens/sec\nDecode: 22 tokens/sec\n",
        )
        .finish();
    mock
}

#[tokio::test]
async fn test_chat_completion_json() {
    let mock = paris_mock();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "model": "gemma3-1b",
            "messages": [{"role": "user", "content": "Capital of France?"}],
            "temperature": 0.2
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "gemma3-1b");
    assert_eq!(
        body["choices"][0]["message"]["content"],
        "Paris is the capital of France."
    );
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["usage"]["prompt_tokens"], 3);
    assert_eq!(body["usage"]["completion_tokens"], 6);
    assert_eq!(body["metrics"]["prefill_tokens_per_sec"], 120.5);
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));

    let history = mock.get_call_history();
    assert_eq!(
        history[0].args.last().map(String::as_str),
        Some("--input_prompt=Capital of France?")
    );
}

#[tokio::test]
async fn test_backend_override_reaches_binary() {
    let mock = paris_mock();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "backend": "gpu"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.get_call_history()[0].args[0], "--backend=gpu");
}

#[tokio::test]
async fn test_chat_completion_stream() {
    let mock = paris_mock();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "Capital of France?"}],
            "stream": true,
            "stream_options": {"include_usage": true}
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let text = body_text(response).await;
    let events: Vec<&str> = text
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .collect();

    assert_eq!(events.last(), Some(&"[DONE]"));

    let chunks: Vec<Value> = events[..events.len() - 1]
        .iter()
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    assert_eq!(chunks[0]["choices"][0]["delta"]["role"], "assistant");

    let content: String = chunks[1..chunks.len() - 1]
        .iter()
        .map(|chunk| chunk["choices"][0]["delta"]["content"].as_str().unwrap())
        .collect();
    assert_eq!(content, "Paris is the capital of France.");
    assert_eq!(chunks.len(), 5);

    let terminal = chunks.last().unwrap();
    assert_eq!(terminal["choices"][0]["finish_reason"], "stop");
    assert_eq!(terminal["choices"][0]["delta"], json!({}));
    assert_eq!(terminal["usage"]["completion_tokens"], 6);
    assert!(chunks
        .iter()
        .all(|chunk| chunk["object"] == "chat.completion.chunk"));
}

#[tokio::test]
async fn test_stream_error_event_then_done() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("F0000 00:00:00 Check failure: model load")
        .returns_exit_code(1)
        .finish();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "stream": true
        })))
        .await
        .unwrap();
    let text = body_text(response).await;
    let events: Vec<&str> = text
        .split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .collect();

    assert_eq!(events.len(), 3);
    let error: Value = serde_json::from_str(events[1]).unwrap();
    assert_eq!(error["error"]["type"], "inference_fatal_error");
    assert_eq!(events[2], "[DONE]");
}

#[tokio::test]
async fn test_fatal_error_maps_to_500() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("I0000 start\nF0000 00:00:00 Check failure: model load")
        .returns_exit_code(1)
        .finish();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "inference_fatal_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .ends_with("F0000 00:00:00 Check failure: model load"));
}

#[tokio::test]
async fn test_non_fatal_error_maps_to_502() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command(BINARY)
        .returns_stderr("E0000 unsupported backend")
        .returns_exit_code(2)
        .finish();
    let app = router_with(&mock, test_config());

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "inference_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unsupported backend"));
}

#[tokio::test]
async fn test_rejects_invalid_requests() {
    let mock = MockProcessRunner::new();

    let response = router_with(&mock, test_config())
        .oneshot(chat_request(json!({"messages": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router_with(&mock, test_config())
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "n": 2
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock.get_call_history().is_empty());
}

#[tokio::test]
async fn test_list_models() {
    let mock = MockProcessRunner::new();
    let response = router_with(&mock, test_config())
        .oneshot(get("/v1/models"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "gemma3-1b");
    assert_eq!(body["data"][0]["owned_by"], "local");
}

#[tokio::test]
async fn test_api_key_required_on_v1_routes() {
    let mock = MockProcessRunner::new();
    let mut config = test_config();
    config.server.api_key = Some("sk-local".to_string());

    let response = router_with(&mock, config.clone())
        .oneshot(get("/v1/models"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "authentication_error");

    let request = Request::builder()
        .uri("/v1/models")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = router_with(&mock, config.clone())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/models")
        .header(header::AUTHORIZATION, "Bearer sk-local")
        .body(Body::empty())
        .unwrap();
    let response = router_with(&mock, config.clone())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays open
    let response = router_with(&mock, config)
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_missing_binary() {
    let mock = MockProcessRunner::new();
    let response = router_with(&mock, test_config())
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["backend"], "cpu");
    assert_eq!(body["model"], "gemma3-1b");
    assert_eq!(body["binary_found"], false);
    assert!(body.get("self_test").is_none());
}

#[tokio::test]
async fn test_health_self_test() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("litert_lm_main");
    let model = dir.path().join("tiny.litertlm");
    std::fs::write(&binary, "#!/bin/sh\n").unwrap();
    std::fs::write(&model, "").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let mut config = test_config();
    config.inference.binary_path = binary.clone();
    config.inference.model_path = model;

    let mut mock = MockProcessRunner::new();
    mock.expect_command(binary.to_str().unwrap())
        .returns_stdout("Response: Hello there!")
        .finish();

    let response = router_with(&mock, config)
        .oneshot(get("/health?self_test=true&timeout_secs=5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "tiny");
    assert_eq!(body["self_test"]["ok"], true);
    assert_eq!(body["self_test"]["answer"], "Hello there!");
    assert_eq!(
        mock.get_call_history()[0].timeout,
        Some(Duration::from_secs(5))
    );
}
