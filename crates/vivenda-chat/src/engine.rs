//! The message pipeline behind the widget input box.

use std::sync::Arc;

use tokio::sync::Mutex;

use vivenda_ai::{ChatCompletionClient, CompletionRequest};

use crate::extract;
use crate::leadsave::{attempt_save, LeadSaveClient};
use crate::sentiment;
use crate::session::{ChatSession, SessionStorage};

/// Drives one visitor conversation.
///
/// Extraction and scoring run synchronously per message; the lead save is a
/// spawned fire-and-forget task guarded by the session's pending flag; the
/// completion call is awaited. `handle_message` takes `&mut self`, so there
/// is never more than one in-flight completion per session — the save task
/// and the completion may overlap, each guarded independently.
pub struct ChatEngine<S: SessionStorage + 'static> {
    session: Arc<Mutex<ChatSession>>,
    storage: Arc<Mutex<S>>,
    lead_client: Arc<LeadSaveClient>,
    completion: Arc<ChatCompletionClient>,
    origin: String,
    page_url: Option<String>,
    page_context: Option<String>,
}

impl<S: SessionStorage + 'static> ChatEngine<S> {
    /// Builds an engine, resuming extraction progress from `storage`.
    pub fn new(
        storage: S,
        lead_client: LeadSaveClient,
        completion: ChatCompletionClient,
        origin: impl Into<String>,
    ) -> Self {
        let session = ChatSession::restore(&storage);
        Self {
            session: Arc::new(Mutex::new(session)),
            storage: Arc::new(Mutex::new(storage)),
            lead_client: Arc::new(lead_client),
            completion: Arc::new(completion),
            origin: origin.into(),
            page_url: None,
            page_context: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, url: Option<String>, context: Option<String>) -> Self {
        self.page_url = url;
        self.page_context = context;
        self
    }

    /// Processes one visitor message and returns the assistant reply.
    ///
    /// Runs the extractors (first extraction wins, never overwritten),
    /// applies the sentiment delta, persists state, opportunistically fires
    /// the silent lead save, then asks the completion endpoint for a reply.
    pub async fn handle_message(&mut self, text: &str) -> String {
        {
            let mut session = self.session.lock().await;
            session.push_user(text);

            if let Some(name) = extract::extract_name(text) {
                session.set_name(&name);
            }
            if let Some(phone) = extract::extract_phone(text) {
                session.set_phone(&phone);
            }
            if let Some(property_type) = extract::extract_property_type(text) {
                session.set_property_type(property_type);
            }
            if let Some(interest) = extract::extract_interest(text) {
                session.set_interest(interest);
            }
            session.apply_sentiment(sentiment::classify(text).delta());

            let mut storage = self.storage.lock().await;
            session.persist(&mut *storage);
        }

        self.spawn_lead_save_if_ready().await;

        let request = {
            let session = self.session.lock().await;
            CompletionRequest {
                messages: session.recent_messages().to_vec(),
                client_name: session.client_name().map(ToOwned::to_owned),
                client_phone: session.client_phone().map(ToOwned::to_owned),
                origin: self.origin.clone(),
                page_url: self.page_url.clone(),
                page_context: self.page_context.clone(),
                skip_lead_creation: session.lead_saved(),
            }
        };

        let reply = self.completion.reply(&request).await;

        {
            let mut session = self.session.lock().await;
            session.push_assistant(reply.clone());
            let mut storage = self.storage.lock().await;
            session.persist(&mut *storage);
        }

        reply
    }

    /// Fires the decoupled save task when the session qualifies.
    ///
    /// The pre-check avoids spawning a task per message once the lead is
    /// saved; `attempt_save` re-checks everything under the lock, so a stale
    /// pre-check is harmless.
    async fn spawn_lead_save_if_ready(&self) {
        if !self.session.lock().await.ready_for_save() {
            return;
        }
        let session = Arc::clone(&self.session);
        let storage = Arc::clone(&self.storage);
        let client = Arc::clone(&self.lead_client);
        let origin = self.origin.clone();
        tokio::spawn(async move {
            attempt_save(&session, &storage, &client, &origin).await;
        });
    }

    /// Shared handle to the session state, for hosts that render it.
    #[must_use]
    pub fn session(&self) -> Arc<Mutex<ChatSession>> {
        Arc::clone(&self.session)
    }

    pub async fn lead_score(&self) -> i32 {
        self.session.lock().await.lead_score()
    }

    pub async fn lead_saved(&self) -> bool {
        self.session.lock().await.lead_saved()
    }
}
