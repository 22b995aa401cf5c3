use thiserror::Error;

/// Errors from one follow-up batch or one lead inside it.
#[derive(Debug, Error)]
pub enum FollowupError {
    #[error(transparent)]
    Db(#[from] vivenda_db::DbError),

    #[error(transparent)]
    Whatsapp(#[from] vivenda_whatsapp::WhatsappError),

    /// A candidate row slipped through the query filter without a phone.
    #[error("lead {lead_id} has no phone to message")]
    MissingPhone { lead_id: i64 },
}
