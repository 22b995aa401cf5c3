//! `WhatsApp` Cloud API client for outbound follow-up messages.
//!
//! One operation, [`WhatsappClient::send_text`], with bearer auth and
//! retry-with-backoff on transient failures. The follow-up runner owns
//! the decision of what to send and when; this crate only delivers.

pub mod client;
pub mod error;
mod retry;

pub use client::WhatsappClient;
pub use error::WhatsappError;
