//! HTTP client for the `WhatsApp` Cloud API text-message endpoint.
//!
//! Wraps `reqwest` with bearer-token auth, transient-error retry, and the
//! Cloud API's JSON envelopes. Only plain text messages are sent; every
//! follow-up track goes out through [`WhatsappClient::send_text`].

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::WhatsappError;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Serialize)]
struct SendTextBody<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the `WhatsApp` Cloud API.
///
/// Use [`WhatsappClient::new`] for production or
/// [`WhatsappClient::with_base_url`] to point at a mock server in tests.
pub struct WhatsappClient {
    client: Client,
    base_url: Url,
    token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl WhatsappClient {
    /// Creates a client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`WhatsappError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, WhatsappError> {
        Self::with_base_url(token, timeout_secs, max_retries, backoff_base_ms, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`WhatsappError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WhatsappError::ApiError`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, WhatsappError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vivenda/0.1 (lead-engine)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| WhatsappError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: token.to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Sends a plain text message and returns the provider message ID.
    ///
    /// `to` is a full phone number in digits (DDI + DDD + number). Transient
    /// failures are retried with back-off before the error is surfaced.
    ///
    /// # Errors
    ///
    /// - [`WhatsappError::ApiError`] if the Cloud API rejects the send.
    /// - [`WhatsappError::Http`] on network failure or non-2xx HTTP status
    ///   after retries are exhausted.
    /// - [`WhatsappError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String, WhatsappError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_text_once(to, body)
        })
        .await
    }

    async fn send_text_once(&self, to: &str, body: &str) -> Result<String, WhatsappError> {
        let url = self
            .base_url
            .join("messages")
            .map_err(|e| WhatsappError::ApiError(format!("invalid messages URL: {e}")))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&SendTextBody {
                messaging_product: "whatsapp",
                to,
                message_type: "text",
                text: TextPayload { body },
            })
            .send()
            .await?;

        // 5xx is transient for the retry loop. 4xx carries the error
        // envelope, so read the body before deciding.
        let status = response.status();
        if status.is_server_error() {
            if let Err(e) = response.error_for_status() {
                return Err(WhatsappError::Http(e));
            }
            return Err(WhatsappError::ApiError(format!("server error {status}")));
        }

        let bytes = response.bytes().await?;
        let parsed: SendResponse =
            serde_json::from_slice(&bytes).map_err(|e| WhatsappError::Deserialize {
                context: format!("send_text(to={to}, status={status})"),
                source: e,
            })?;

        if let Some(err) = parsed.error {
            return Err(WhatsappError::ApiError(err.message));
        }

        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| WhatsappError::ApiError("response carried no message id".to_owned()))
    }
}
