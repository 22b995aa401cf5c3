//! Request/response shapes for the chat-completion endpoints.

use serde::{Deserialize, Serialize};
use vivenda_core::ChatMessage;

/// Body posted by the widget to the site's chat endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_context: Option<String>,
    pub skip_lead_creation: bool,
}

/// One decoded payload line from the stream (or the whole non-stream body).
///
/// Three shapes are tolerated: incremental OpenAI-style token deltas, a
/// one-shot top-level `reply`/`message` field, and the enveloped
/// `{data: {reply}}` form the bundled server answers with. Unknown fields
/// are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyPayload {
    #[serde(default)]
    pub choices: Vec<ReplyChoice>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<ReplyData>,
}

/// The `data` object of an enveloped reply body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyData {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyChoice {
    #[serde(default)]
    pub delta: ReplyDelta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ReplyPayload {
    /// The one-shot replacement reply, if this payload carries one.
    pub(crate) fn replacement(&self) -> Option<&str> {
        self.reply
            .as_deref()
            .or(self.message.as_deref())
            .or_else(|| {
                self.data
                    .as_ref()
                    .and_then(|d| d.reply.as_deref().or(d.message.as_deref()))
            })
    }

    /// The incremental token, if this payload carries one.
    pub(crate) fn token(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }
}

/// OpenAI-style chat-completions request sent by [`crate::ProviderClient`].
#[derive(Debug, Serialize)]
pub(crate) struct ProviderRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    #[serde(default)]
    pub choices: Vec<ProviderChoice>,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderChoice {
    pub message: ProviderMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderError {
    pub message: String,
}
