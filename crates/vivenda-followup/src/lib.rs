//! Follow-up scheduler: three tracks over the shared `followup_stage`
//! counter.
//!
//! Track A re-engages quiet leads at 1 h / 24 h / 72 h / 168 h. Track B
//! reminds the assigned broker at 15 / 60 / 240 minutes of SLA breach.
//! Track C nurtures cold leads with one educational topic every five days.
//! [`run_followups`] executes one stateless batch; the server wires it to a
//! cron job, the CLI runs it on demand.

pub mod broker;
pub mod error;
pub mod messages;
pub mod nurturing;
pub mod phase;
pub mod reengagement;
pub mod runner;
pub mod store;

pub use error::FollowupError;
pub use phase::{FollowupPhase, REENGAGEMENT_STAGE_COUNT};
pub use runner::{run_followups, RunSummary};
pub use store::FollowupStore;
