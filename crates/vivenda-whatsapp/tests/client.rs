//! Integration tests for the `WhatsApp` client against a wiremock server.

use vivenda_whatsapp::{WhatsappClient, WhatsappError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WhatsappClient {
    // backoff_base_ms = 0 keeps retrying tests fast.
    WhatsappClient::with_base_url("test-token", 10, 3, 0, &server.uri())
        .expect("client should build")
}

#[tokio::test]
async fn send_text_returns_message_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "messaging_product": "whatsapp",
            "to": "5562999991234",
            "type": "text",
            "text": {"body": "Olá! Ainda posso te ajudar?"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"id": "wamid.ABC123"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server)
        .send_text("5562999991234", "Olá! Ainda posso te ajudar?")
        .await
        .expect("send should succeed");
    assert_eq!(id, "wamid.ABC123");
}

#[tokio::test]
async fn api_error_envelope_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "Invalid recipient"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .send_text("0", "oi")
        .await
        .expect_err("API error must fail");
    assert!(matches!(err, WhatsappError::ApiError(ref m) if m == "Invalid recipient"));
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [{"id": "wamid.RETRY"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server)
        .send_text("5562999991234", "seguimos à disposição")
        .await
        .expect("send should succeed after retries");
    assert_eq!(id, "wamid.RETRY");
}

#[tokio::test]
async fn missing_message_id_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})))
        .mount(&server)
        .await;

    let err = client(&server)
        .send_text("5562999991234", "oi")
        .await
        .expect_err("empty messages array must fail");
    assert!(matches!(err, WhatsappError::ApiError(_)));
}
