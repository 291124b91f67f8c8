//! Pillar Gemini
//!
//! Thin async client for the Generative Language REST API:
//! - `generateContent` for structured extraction
//! - `streamGenerateContent?alt=sse` for incremental replies
//! - Credential failures are distinguishable from other errors

mod client;
mod error;
mod stream;
mod types;

pub use client::{GeminiClient, GeminiConfig};
pub use error::GeminiError;
pub use stream::{text_stream, TextStream};
pub use types::{
    ApiErrorBody, Blob, Candidate, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, PromptFeedback, UsageMetadata,
};

pub type Result<T> = std::result::Result<T, GeminiError>;
