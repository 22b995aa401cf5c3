//! Silent, fire-and-forget lead persistence.
//!
//! [`attempt_save`] is idempotent and safe to call on every message: the
//! session's pending flag guarantees at most one in-flight request, and a
//! successful save is permanent for the session. Failures clear the pending
//! flag and nothing else, so the next qualifying message retries — no
//! backoff, no attempt limit, and nothing is ever shown to the visitor.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ChatError;
use crate::session::{ChatSession, SessionStorage};

/// Outcome of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAttempt {
    /// The lead is saved (now, or by an earlier attempt).
    Saved,
    /// Another attempt is already in flight; nothing was issued.
    Pending,
    /// Preconditions not met, or the request failed and will be retried
    /// on the next qualifying message.
    NotReady,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadSaveBody<'a> {
    client_name: &'a str,
    client_phone: &'a str,
    origin: &'a str,
}

/// Client for the lead-save endpoint.
pub struct LeadSaveClient {
    client: Client,
    endpoint: Url,
}

impl LeadSaveClient {
    /// Creates a client posting to the given lead endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidEndpoint`] if `endpoint` does not parse,
    /// or [`ChatError::Http`] if the HTTP client cannot be constructed.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ChatError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| ChatError::InvalidEndpoint(endpoint.to_owned()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vivenda/0.1 (lead-engine)")
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Posts `{clientName, clientPhone, origin}`; any 2xx is success.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Http`] on transport failure or
    /// [`ChatError::SaveRejected`] on a non-2xx status.
    pub async fn save(&self, name: &str, phone: &str, origin: &str) -> Result<(), ChatError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&LeadSaveBody {
                client_name: name,
                client_phone: phone,
                origin,
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChatError::SaveRejected {
                status: response.status().as_u16(),
            })
        }
    }
}

/// Issues at most one save attempt for the session.
///
/// Checks the preconditions under the session lock, flips the pending flag,
/// performs the request without holding the lock, then records the outcome.
/// Callable any number of times; converges to exactly one effective save.
pub async fn attempt_save<S: SessionStorage>(
    session: &Arc<Mutex<ChatSession>>,
    storage: &Arc<Mutex<S>>,
    client: &LeadSaveClient,
    origin: &str,
) -> SaveAttempt {
    let (name, phone) = {
        let mut guard = session.lock().await;
        if guard.lead_saved() {
            return SaveAttempt::Saved;
        }
        if guard.pending_lead_save() {
            return SaveAttempt::Pending;
        }
        if !guard.ready_for_save() {
            return SaveAttempt::NotReady;
        }
        guard.begin_save();
        (
            guard.client_name().unwrap_or_default().to_owned(),
            guard.client_phone().unwrap_or_default().to_owned(),
        )
    };

    match client.save(&name, &phone, origin).await {
        Ok(()) => {
            let mut guard = session.lock().await;
            guard.finish_save(true);
            let mut storage = storage.lock().await;
            guard.persist(&mut *storage);
            tracing::debug!(origin, "lead saved silently");
            SaveAttempt::Saved
        }
        Err(e) => {
            tracing::warn!(error = %e, "silent lead save failed; will retry on next message");
            session.lock().await.finish_save(false);
            SaveAttempt::NotReady
        }
    }
}
