//! Chat-widget session engine: silent lead extraction, sentiment scoring,
//! session state, opportunistic lead persistence, and the message pipeline.
//!
//! Everything the visitor types flows through [`ChatEngine::handle_message`];
//! extraction and scoring are pure functions so they can be tested without a
//! network or a browser environment.

mod engine;
mod error;
pub mod extract;
mod leadsave;
mod normalize;
pub mod sentiment;
mod session;

pub use engine::ChatEngine;
pub use error::ChatError;
pub use leadsave::{attempt_save, LeadSaveClient, SaveAttempt};
pub use normalize::normalize_text;
pub use session::{
    ChatSession, MemoryStorage, SessionStorage, INITIAL_SCORE, MAX_SCORE, MIN_SCORE,
    UPSTREAM_MESSAGE_WINDOW,
};
