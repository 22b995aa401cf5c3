//! HTTP clients for the widget chat endpoint and the completion provider.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{header, Client, Url};
use vivenda_core::{ChatMessage, ChatRole};

use crate::assemble::ReplyAssembler;
use crate::error::AiError;
use crate::types::{CompletionRequest, ProviderRequest, ProviderResponse, ReplyPayload};

/// The only failure text a visitor ever sees from the chat.
pub const FALLBACK_REPLY: &str =
    "Desculpe, tive um problema para responder agora. Pode tentar de novo em instantes?";

const USER_AGENT: &str = "vivenda/0.1 (lead-engine)";

fn build_http_client(timeout_secs: u64) -> Result<Client, AiError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(AiError::from)
}

/// Widget-side client for the site's chat endpoint.
///
/// The endpoint answers either a single JSON object with a `reply`/`message`
/// field or a `text/event-stream` body; both are decoded into one assembled
/// reply string.
pub struct ChatCompletionClient {
    client: Client,
    endpoint: Url,
}

impl ChatCompletionClient {
    /// Creates a client posting to the given chat endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::ApiError`] if `endpoint` is not a valid
    /// URL.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, AiError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AiError::ApiError(format!("invalid chat endpoint '{endpoint}': {e}")))?;
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint,
        })
    }

    /// Sends the conversation window and returns the assembled reply.
    ///
    /// Never fails from the caller's point of view: any transport or decode
    /// problem is logged and replaced with [`FALLBACK_REPLY`]. The chat must
    /// never show a raw error to the visitor.
    pub async fn reply(&self, request: &CompletionRequest) -> String {
        match self.try_reply(request).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!("chat completion returned an empty reply; using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat completion failed; using fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn try_reply(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let is_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if is_stream {
            let mut assembler = ReplyAssembler::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                assembler.feed(&chunk?);
            }
            return Ok(assembler.finish());
        }

        let value = response.json::<serde_json::Value>().await?;
        let payload: ReplyPayload =
            serde_json::from_value(value).map_err(|e| AiError::Deserialize {
                context: "chat reply body".to_owned(),
                source: e,
            })?;
        payload
            .replacement()
            .map(ToOwned::to_owned)
            .ok_or(AiError::EmptyReply)
    }
}

/// Server-side client for an OpenAI-style chat-completions provider.
pub struct ProviderClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
}

impl ProviderClient {
    /// Creates a provider client from a base URL (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::ApiError`] if `base_url` is invalid.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, AiError> {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| AiError::ApiError(format!("invalid provider URL '{base_url}': {e}")))?;
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint,
            api_key,
            model: model.to_owned(),
        })
    }

    /// Runs a tool-free system+user prompt and returns the free-text answer.
    ///
    /// # Errors
    ///
    /// - [`AiError::Http`] on network failure or non-2xx status.
    /// - [`AiError::ApiError`] if the provider returns an error envelope.
    /// - [`AiError::Deserialize`] if the body does not match the expected shape.
    /// - [`AiError::EmptyReply`] if the answer has no usable text.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        let request = ProviderRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: system.to_owned(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: user.to_owned(),
                },
            ],
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?.error_for_status()?;
        let value = response.json::<serde_json::Value>().await?;
        let parsed: ProviderResponse =
            serde_json::from_value(value).map_err(|e| AiError::Deserialize {
                context: "chat/completions".to_owned(),
                source: e,
            })?;

        if let Some(error) = parsed.error {
            return Err(AiError::ApiError(error.message));
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyReply)
    }
}
