//! Error types for the transport.

use thiserror::Error;

/// Errors that can occur while connecting to or delivering to a backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint string is not a supported URI.
    #[error("Invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Opening the backend connection failed.
    #[error("Connection to {endpoint} failed: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The consumer has shut down and accepts no more observations.
    #[error("Transport is closed")]
    Closed,

    /// A batch could not be delivered; the consumer stopped.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// A batch could not be encoded.
    #[error("Failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    /// The consumer task ended abnormally.
    #[error("Consumer task failed: {0}")]
    Task(String),
}

impl TransportError {
    pub(crate) fn invalid_endpoint(endpoint: &str, reason: impl Into<String>) -> Self {
        TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
