//! Gemini client error types

use std::time::Duration;
use thiserror::Error;

use crate::types::ApiErrorBody;

/// Substrings the API uses when the key itself is the problem. The second
/// one is what hosted key-selection flows return for a revoked key.
const AUTH_MARKERS: &[&str] = &[
    "API key not valid",
    "API_KEY_INVALID",
    "Requested entity was not found",
];

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("SSE error: {0}")]
    Stream(String),

    #[error("Stream idle for {0:?}")]
    IdleTimeout(Duration),
}

impl GeminiError {
    pub(crate) fn from_api_body(status: u16, body: ApiErrorBody) -> Self {
        GeminiError::Api {
            status: body.code.unwrap_or(status),
            code: body.status,
            message: body.message,
        }
    }

    /// True when the failure means the credential is missing or rejected,
    /// so the caller should ask for a new key rather than retry.
    pub fn requires_authentication(&self) -> bool {
        match self {
            GeminiError::MissingApiKey => true,
            GeminiError::Api {
                status,
                code,
                message,
            } => {
                matches!(status, 401 | 403)
                    || matches!(
                        code.as_deref(),
                        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
                    )
                    || AUTH_MARKERS.iter().any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }
}
