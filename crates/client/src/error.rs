//! Error types for the GleSYS client

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using the client Error
pub type Result<T> = std::result::Result<T, Error>;

/// GleSYS client error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {code}: {text}")]
    Api { code: u16, text: String },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True when the API reported that the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { code: 404, .. })
    }

    /// Build an API error from a non-success response.
    ///
    /// GleSYS wraps failures as `{"response": {"status": {"code", "text"}}}`.
    /// When the body is not in that shape the HTTP status and raw body are used.
    pub(crate) fn from_response(http_status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            response: ErrorResponse,
        }

        #[derive(Deserialize)]
        struct ErrorResponse {
            status: ApiStatus,
        }

        #[derive(Deserialize)]
        struct ApiStatus {
            code: u16,
            #[serde(default)]
            text: String,
        }

        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => Error::Api {
                code: envelope.response.status.code,
                text: envelope.response.status.text,
            },
            Err(_) => Error::Api {
                code: http_status,
                text: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }
}
