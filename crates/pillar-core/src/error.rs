//! Core error types

use std::path::PathBuf;
use thiserror::Error;

/// Rejected upload. Shown inline; never changes session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Not a PDF: {0}")]
    NotPdf(String),

    #[error("File is {size} bytes; the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Could not read file: {0}")]
    Unreadable(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] pillar_session::SessionError),

    #[error("Client error: {0}")]
    Client(#[from] pillar_gemini::GeminiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A session is already active; start a new session first")]
    SessionActive,
}
