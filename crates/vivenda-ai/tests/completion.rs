//! Integration tests for the completion clients using wiremock HTTP mocks.

use vivenda_ai::{ChatCompletionClient, CompletionRequest, ProviderClient, FALLBACK_REPLY};
use vivenda_core::ChatMessage;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn widget_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::user("quero um apartamento")],
        client_name: Some("Ana".to_string()),
        client_phone: Some("62999991234".to_string()),
        origin: "site".to_string(),
        page_url: Some("https://example.com/imovel/42".to_string()),
        page_context: None,
        skip_lead_creation: false,
    }
}

fn chat_client(server: &MockServer) -> ChatCompletionClient {
    ChatCompletionClient::new(&format!("{}/api/chat", server.uri()), 10)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn plain_json_reply_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "clientName": "Ana",
            "origin": "site",
            "skipLeadCreation": false,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": "Posso ajudar!"})),
        )
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, "Posso ajudar!");
}

#[tokio::test]
async fn message_field_is_accepted_too() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Olá!"})),
        )
        .mount(&server)
        .await;

    assert_eq!(chat_client(&server).reply(&widget_request()).await, "Olá!");
}

#[tokio::test]
async fn enveloped_reply_body_is_accepted() {
    // The bundled server wraps every response as {data, meta}.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"reply": "Temos três opções."},
            "meta": {"request_id": "req-1", "timestamp": "2026-08-29T12:00:00Z"},
        })))
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, "Temos três opções.");
}

#[tokio::test]
async fn event_stream_is_assembled() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Temos \"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"três opções.\"}}]}\n\
data: [DONE]\n";
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, "Temos três opções.");
}

#[tokio::test]
async fn stream_reply_field_overrides_tokens() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"rascunho\"}}]}\n\
data: {\"reply\":\"resposta final\"}\n\
data: [DONE]\n";
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, "resposta final");
}

#[tokio::test]
async fn server_error_yields_fallback_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn connection_refused_yields_fallback_reply() {
    let client =
        ChatCompletionClient::new("http://127.0.0.1:1/api/chat", 2).expect("client should build");
    let reply = client.reply(&widget_request()).await;
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn empty_reply_body_yields_fallback_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": "  "})))
        .mount(&server)
        .await;

    let reply = chat_client(&server).reply(&widget_request()).await;
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn provider_generate_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Oi, João!"}}]
        })))
        .mount(&server)
        .await;

    let client = ProviderClient::new(&server.uri(), Some("test-key".to_string()), "gpt-4o-mini", 10)
        .expect("client should build");
    let text = client
        .generate("Você é um corretor.", "Escreva uma mensagem de follow-up.")
        .await
        .expect("generate should succeed");
    assert_eq!(text, "Oi, João!");
}

#[tokio::test]
async fn provider_error_envelope_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": {"message": "model overloaded"}
        })))
        .mount(&server)
        .await;

    let client = ProviderClient::new(&server.uri(), None, "gpt-4o-mini", 10)
        .expect("client should build");
    let err = client
        .generate("sistema", "usuário")
        .await
        .expect_err("error envelope must fail");
    assert!(
        err.to_string().contains("model overloaded"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn provider_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let client = ProviderClient::new(&server.uri(), None, "gpt-4o-mini", 10)
        .expect("client should build");
    assert!(client.generate("s", "u").await.is_err());
}
