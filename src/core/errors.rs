// Domain error types for the translation proxy

use thiserror::Error;

/// Main error type for the proxy
///
/// Every variant is surfaced to the legacy client as a plain-text failure;
/// read-path backend status codes never reach this type (see the query forwarder).
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Form body exceeded the normalizer ceiling (HTTP 413)
    #[error("http: request body too large (limit {limit} bytes)")]
    BodyTooLarge { limit: usize },

    /// Inbound body could not be read (HTTP 400)
    #[error("failed to read request body: {0}")]
    RequestBody(String),

    /// Inbound JSON could not be decoded into the legacy shape (HTTP 400)
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Command name outside the four translated commands (HTTP 400)
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),

    /// Transport failure talking to PuppetDB (HTTP 502)
    #[error("backend request failed: {0}")]
    Backend(String),

    /// PuppetDB answered with a body we could not decode (HTTP 502)
    #[error("invalid backend response: {0}")]
    BackendResponse(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ProxyError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::BodyTooLarge { .. } => 413,
            ProxyError::RequestBody(_) => 400,
            ProxyError::MalformedPayload(_) => 400,
            ProxyError::UnsupportedCommand(_) => 400,
            ProxyError::Backend(_) => 502,
            ProxyError::BackendResponse(_) => 502,
            ProxyError::ConfigurationError(_) => 500,
        }
    }

    /// Message returned to the client
    ///
    /// Decode and transport errors carry their underlying text; legacy
    /// clients only ever log it.
    pub fn user_message(&self) -> String {
        match self {
            ProxyError::ConfigurationError(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        ProxyError::MalformedPayload(err.to_string())
    }
}
