//! Session error types

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Another request is still in flight")]
    Busy,

    #[error("Query cannot be empty")]
    EmptyQuery,
}

impl SessionError {
    pub fn requires_authentication(&self) -> bool {
        matches!(self, SessionError::AuthenticationRequired(_))
    }
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthenticated(msg) => SessionError::AuthenticationRequired(msg),
            BackendError::Upstream(msg) => SessionError::Upstream(msg),
        }
    }
}
