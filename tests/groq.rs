//! `GroqClient` against a local chat-completions stub.
//!
//! Every way the remote call can go wrong must come back as
//! `TranslateError::TranslationService`.

#![cfg(feature = "server")]

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use docx_translate::{GroqClient, TranslateError, TranslationClient, TranslatorConfig};
use serde_json::{json, Value};

/// Serve `app` on an ephemeral loopback port; returns the API root.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/openai/v1")
}

/// A stub that answers every completion request with `status` and `body`.
async fn stub(status: StatusCode, body: &'static str) -> String {
    serve(Router::new().route(
        "/openai/v1/chat/completions",
        post(move || async move { (status, body) }),
    ))
    .await
}

fn client(base_url: &str) -> GroqClient {
    let config = TranslatorConfig::builder()
        .api_key("gsk_test")
        .base_url(base_url)
        .build()
        .unwrap();
    GroqClient::new(&config).unwrap()
}

async fn translate_err(base_url: &str) -> TranslateError {
    client(base_url)
        .translate("مرحبا", "SYSTEM")
        .await
        .unwrap_err()
}

#[tokio::test]
async fn reply_is_trimmed_and_request_is_authorised() {
    let base = serve(Router::new().route(
        "/openai/v1/chat/completions",
        post(|headers: HeaderMap, Json(req): Json<Value>| async move {
            let auth = headers["authorization"].to_str().unwrap().to_string();
            let echo = format!(
                "  {auth}|{}|{}\n",
                req["messages"][0]["content"].as_str().unwrap(),
                req["messages"][1]["content"].as_str().unwrap()
            );
            Json(json!({
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": echo } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
            }))
        }),
    ))
    .await;

    let out = client(&base).translate("مرحبا", "SYSTEM").await.unwrap();
    assert_eq!(out, "Bearer gsk_test|SYSTEM|Text to translate:\nمرحبا");
}

#[tokio::test]
async fn auth_rejection_is_service_error() {
    let base = stub(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#,
    )
    .await;
    match translate_err(&base).await {
        TranslateError::TranslationService { provider, detail } => {
            assert_eq!(provider, "groq");
            assert!(detail.contains("401"), "{detail}");
            assert!(detail.contains("Invalid API Key"), "{detail}");
        }
        other => panic!("expected TranslationService, got {other:?}"),
    }
}

#[tokio::test]
async fn quota_rejection_is_service_error() {
    let base = stub(StatusCode::TOO_MANY_REQUESTS, "rate limit reached").await;
    let err = translate_err(&base).await;
    assert!(matches!(err, TranslateError::TranslationService { .. }), "{err}");
}

#[tokio::test]
async fn non_json_body_is_service_error() {
    let base = stub(StatusCode::OK, "<html>gateway</html>").await;
    let err = translate_err(&base).await;
    assert!(matches!(err, TranslateError::TranslationService { .. }), "{err}");
    assert!(err.to_string().contains("malformed response"), "{err}");
}

#[tokio::test]
async fn empty_choices_is_service_error() {
    let base = stub(StatusCode::OK, r#"{"choices":[]}"#).await;
    let err = translate_err(&base).await;
    assert!(matches!(err, TranslateError::TranslationService { .. }), "{err}");
}

#[tokio::test]
async fn null_content_is_service_error() {
    let base = stub(
        StatusCode::OK,
        r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null}}]}"#,
    )
    .await;
    let err = translate_err(&base).await;
    assert!(matches!(err, TranslateError::TranslationService { .. }), "{err}");
}
