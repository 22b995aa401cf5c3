//! Conversation state for one widget session, mirrored to a session-scoped
//! key-value storage so a returning page view resumes extraction progress.

use std::collections::HashMap;

use vivenda_core::ChatMessage;

/// Initial lead score for a fresh session.
pub const INITIAL_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Only the most recent N messages are sent upstream per completion request.
pub const UPSTREAM_MESSAGE_WINDOW: usize = 10;

const KEY_LEAD_SAVED: &str = "vivenda_lead_saved";
const KEY_NAME: &str = "vivenda_client_name";
const KEY_PHONE: &str = "vivenda_client_phone";
const KEY_PROPERTY_TYPE: &str = "vivenda_property_type";
const KEY_INTEREST: &str = "vivenda_interest";
const KEY_SCORE: &str = "vivenda_lead_score";

/// Session-scoped string key-value storage.
///
/// Abstracts the browser's session storage so the engine can run against an
/// in-memory map in tests and in the REPL.
pub trait SessionStorage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory [`SessionStorage`] for tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// State of one chat session.
///
/// `messages` is append-only; the extracted fields are set at most once
/// (first successful extraction wins); `lead_saved` only ever goes
/// false→true; `pending_lead_save` guards against overlapping save attempts.
#[derive(Debug)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    client_name: Option<String>,
    client_phone: Option<String>,
    property_type: Option<String>,
    interest: Option<String>,
    lead_score: i32,
    lead_saved: bool,
    pending_lead_save: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            client_name: None,
            client_phone: None,
            property_type: None,
            interest: None,
            lead_score: INITIAL_SCORE,
            lead_saved: false,
            pending_lead_save: false,
        }
    }

    /// Rebuilds session fields from storage. Messages are not persisted;
    /// only extraction progress and the save flag survive a page reload.
    #[must_use]
    pub fn restore(storage: &dyn SessionStorage) -> Self {
        let mut session = Self::new();
        session.client_name = storage.get(KEY_NAME);
        session.client_phone = storage.get(KEY_PHONE);
        session.property_type = storage.get(KEY_PROPERTY_TYPE);
        session.interest = storage.get(KEY_INTEREST);
        session.lead_saved = storage.get(KEY_LEAD_SAVED).as_deref() == Some("true");
        if let Some(score) = storage.get(KEY_SCORE).and_then(|s| s.parse::<i32>().ok()) {
            session.lead_score = score.clamp(MIN_SCORE, MAX_SCORE);
        }
        session
    }

    /// Writes extraction progress and the save flag back to storage.
    pub fn persist(&self, storage: &mut dyn SessionStorage) {
        if let Some(name) = &self.client_name {
            storage.set(KEY_NAME, name);
        }
        if let Some(phone) = &self.client_phone {
            storage.set(KEY_PHONE, phone);
        }
        if let Some(property_type) = &self.property_type {
            storage.set(KEY_PROPERTY_TYPE, property_type);
        }
        if let Some(interest) = &self.interest {
            storage.set(KEY_INTEREST, interest);
        }
        storage.set(KEY_LEAD_SAVED, if self.lead_saved { "true" } else { "false" });
        storage.set(KEY_SCORE, &self.lead_score.to_string());
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// The trailing window of messages sent upstream.
    #[must_use]
    pub fn recent_messages(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(UPSTREAM_MESSAGE_WINDOW);
        &self.messages[start..]
    }

    /// Sets the name if not already set. Returns whether the value was taken.
    pub fn set_name(&mut self, name: &str) -> bool {
        set_once(&mut self.client_name, name)
    }

    pub fn set_phone(&mut self, phone: &str) -> bool {
        set_once(&mut self.client_phone, phone)
    }

    pub fn set_property_type(&mut self, property_type: &str) -> bool {
        set_once(&mut self.property_type, property_type)
    }

    pub fn set_interest(&mut self, interest: &str) -> bool {
        set_once(&mut self.interest, interest)
    }

    #[must_use]
    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    #[must_use]
    pub fn client_phone(&self) -> Option<&str> {
        self.client_phone.as_deref()
    }

    #[must_use]
    pub fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    #[must_use]
    pub fn interest(&self) -> Option<&str> {
        self.interest.as_deref()
    }

    #[must_use]
    pub fn lead_score(&self) -> i32 {
        self.lead_score
    }

    #[must_use]
    pub fn lead_saved(&self) -> bool {
        self.lead_saved
    }

    #[must_use]
    pub fn pending_lead_save(&self) -> bool {
        self.pending_lead_save
    }

    /// Applies a sentiment delta, keeping the score in `[0, 100]`.
    pub fn apply_sentiment(&mut self, delta: i32) {
        self.lead_score = crate::sentiment::apply_delta(self.lead_score, delta);
    }

    /// Whether a save attempt should be issued right now: not saved, not
    /// already in flight, both contact fields known, phone plausibly valid.
    #[must_use]
    pub fn ready_for_save(&self) -> bool {
        !self.lead_saved
            && !self.pending_lead_save
            && self.client_name.is_some()
            && self
                .client_phone
                .as_deref()
                .is_some_and(|p| p.chars().filter(char::is_ascii_digit).count() >= 10)
    }

    pub(crate) fn begin_save(&mut self) {
        self.pending_lead_save = true;
    }

    pub(crate) fn finish_save(&mut self, success: bool) {
        self.pending_lead_save = false;
        if success {
            self.lead_saved = true;
        }
    }
}

fn set_once(slot: &mut Option<String>, value: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value.to_string());
    true
}
