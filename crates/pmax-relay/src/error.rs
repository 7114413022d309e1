use thiserror::Error;

/// Errors returned by the collaborator HTTP clients.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid collaborator URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
