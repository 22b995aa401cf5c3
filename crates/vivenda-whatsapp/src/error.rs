use thiserror::Error;

/// Errors from the `WhatsApp` Cloud API client.
#[derive(Debug, Error)]
pub enum WhatsappError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Cloud API returned its error envelope.
    #[error("WhatsApp API error: {0}")]
    ApiError(String),

    /// The response body did not match the expected shape.
    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
