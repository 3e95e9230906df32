//! Tests for `DispatchRouter`.

mod common;

use common::{ScriptedTransport, registry_with};
use prat::{DispatchError, DispatchRouter, Message, ProviderKey};
use serde_json::json;

fn router(transport: std::sync::Arc<ScriptedTransport>, keys: &[ProviderKey]) -> DispatchRouter {
    DispatchRouter::new(registry_with(keys), transport)
}

#[tokio::test]
async fn normalizes_each_vendor_shape() {
    let transport = ScriptedTransport::new();
    transport.reply_json(json!({ "choices": [{ "message": { "content": "from openai" } }] }));
    transport.reply_json(json!({ "content": [{ "type": "text", "text": "from claude" }] }));
    transport.reply_json(json!({ "candidates": [{ "content": { "parts": [{ "text": "from gemini" }] } }] }));
    transport.reply_json(json!({ "response": "from local" }));

    let router = router(transport.clone(), &ProviderKey::ALL);
    let message = Message::new("Hello").unwrap();

    for (key, expected) in [
        (ProviderKey::OpenAI, "from openai"),
        (ProviderKey::Claude, "from claude"),
        (ProviderKey::Gemini, "from gemini"),
        (ProviderKey::Local, "from local"),
    ] {
        let response = router.send(key, &message).await.unwrap();
        assert_eq!(response.text, expected);
    }
    assert_eq!(transport.calls(), 4);
}

#[tokio::test]
async fn sends_exactly_one_request_built_by_the_adapter() {
    let transport = ScriptedTransport::new();
    transport.reply_json(json!({ "content": [{ "text": "hi" }] }));

    let router = router(transport.clone(), &[ProviderKey::Claude]);
    router
        .send(ProviderKey::Claude, &Message::new("Hello").unwrap())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].endpoint, "https://api.anthropic.com/v1/messages");
    assert_eq!(requests[0].header_value("x-api-key"), Some("claude-key"));
    assert_eq!(requests[0].body["messages"][0]["content"], "Hello");
}

#[tokio::test]
async fn unregistered_provider_fails_before_any_network_call() {
    let transport = ScriptedTransport::new();
    let router = router(transport.clone(), &[ProviderKey::OpenAI]);

    let err = router
        .send(ProviderKey::Gemini, &Message::new("Hello").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, DispatchError::UnsupportedProvider("gemini".to_string()));
    assert_eq!(transport.calls(), 0);
    assert_eq!(router.providers(), vec![ProviderKey::OpenAI]);
}

#[tokio::test]
async fn transport_failures_pass_through_without_retry() {
    let transport = ScriptedTransport::new();
    transport.fail(DispatchError::Transport {
        status: Some(503),
        message: "backend returned HTTP 503 Service Unavailable".to_string(),
    });

    let router = router(transport.clone(), &[ProviderKey::OpenAI]);
    let err = router
        .send(ProviderKey::OpenAI, &Message::new("Hello").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn shape_mismatch_is_malformed_response() {
    let transport = ScriptedTransport::new();
    // claude-shaped body for an openai request
    transport.reply_json(json!({ "content": [{ "text": "hi" }] }));

    let router = router(transport, &[ProviderKey::OpenAI]);
    let err = router
        .send(ProviderKey::OpenAI, &Message::new("Hello").unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DispatchError::malformed(ProviderKey::OpenAI, "response did not have the expected shape")
    );
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let transport = ScriptedTransport::new();
    transport.reply_raw("<html>502 Bad Gateway</html>");

    let router = router(transport, &[ProviderKey::Local]);
    let err = router
        .send(ProviderKey::Local, &Message::new("Hello").unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DispatchError::malformed(ProviderKey::Local, "response body is not JSON")
    );
    assert!(!err.to_string().contains("Bad Gateway"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn reply_text_is_not_formatted_by_the_router() {
    let transport = ScriptedTransport::new();
    transport.reply_json(json!({ "response": "**Hi** there\n\nHow can I help?" }));

    let router = router(transport, &[ProviderKey::Local]);
    let response = router
        .send(ProviderKey::Local, &Message::new("Hello").unwrap())
        .await
        .unwrap();

    assert_eq!(response.text, "**Hi** there\n\nHow can I help?");
}
