//! Chat-completion API clients.
//!
//! [`ChatCompletionClient`] is the widget-side client: it posts the trailing
//! conversation window to the site's chat endpoint and decodes either a plain
//! JSON reply or an event-stream, never surfacing an error to the visitor.
//! [`ProviderClient`] is the server-side client for an OpenAI-style provider,
//! used by the chat endpoint and by the follow-up scheduler (which falls back
//! to deterministic templates when it fails).

mod assemble;
mod client;
mod error;
mod types;

pub use assemble::ReplyAssembler;
pub use client::{ChatCompletionClient, ProviderClient, FALLBACK_REPLY};
pub use error::AiError;
pub use types::CompletionRequest;
