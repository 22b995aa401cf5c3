use thiserror::Error;

/// Errors raised by the widget's network paths.
///
/// None of these ever reach the visitor: the completion path replaces
/// failures with a fixed apology string and the lead-save path retries
/// silently on the next qualifying message.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The lead-save endpoint answered with a non-2xx status.
    #[error("lead save rejected with status {status}")]
    SaveRejected { status: u16 },

    /// A configured endpoint is not a valid URL.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}
