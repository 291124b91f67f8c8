//! Model backend seam
//!
//! The session manager speaks in provider-neutral turns. The Gemini client
//! is the production implementation; tests use a scripted backend.

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use thiserror::Error;

use pillar_gemini::{
    Content, GeminiClient, GeminiError, GenerateContentRequest, GenerationConfig, Part,
};

/// Stream of reply fragments from the backend
pub type ChunkStream = BoxStream<'static, Result<String, BackendError>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Credential missing or rejected
    #[error("{0}")]
    Unauthenticated(String),

    /// Any other transport or service failure
    #[error("{0}")]
    Upstream(String),
}

impl From<GeminiError> for BackendError {
    fn from(err: GeminiError) -> Self {
        if err.requires_authentication() {
            BackendError::Unauthenticated(err.to_string())
        } else {
            BackendError::Upstream(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPart {
    Text(String),
    /// Inline document; `data` is base64 and shared across turns
    Document {
        mime_type: &'static str,
        data: Arc<str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    pub fn has_document(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, TurnPart::Document { .. }))
    }
}

/// One request to the model: instruction, history, optional output schema
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_instruction: String,
    pub turns: Vec<Turn>,
    /// When set, the backend must request strict JSON matching this schema
    pub response_schema: Option<serde_json::Value>,
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Single-shot generation returning the full text
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError>;

    /// Streaming generation
    async fn stream_generate(&self, request: ModelRequest) -> Result<ChunkStream, BackendError>;
}

fn to_gemini_request(request: ModelRequest, temperature: Option<f32>) -> GenerateContentRequest {
    let contents = request
        .turns
        .into_iter()
        .map(|turn| {
            let parts = turn
                .parts
                .into_iter()
                .map(|part| match part {
                    TurnPart::Text(text) => Part::text(text),
                    TurnPart::Document { mime_type, data } => Part::inline(mime_type, &*data),
                })
                .collect();
            match turn.role {
                Role::User => Content::user(parts),
                Role::Model => Content::model(parts),
            }
        })
        .collect();

    let generation_config = match (request.response_schema, temperature) {
        (None, None) => None,
        (schema, temperature) => Some(GenerationConfig {
            temperature,
            response_mime_type: schema.as_ref().map(|_| "application/json".to_string()),
            response_schema: schema,
        }),
    };

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::instruction(request.system_instruction)),
        generation_config,
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError> {
        let request = to_gemini_request(request, self.config().temperature);
        let response = self.generate_content(&request).await?;
        response
            .text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| BackendError::from(GeminiError::EmptyResponse))
    }

    async fn stream_generate(&self, request: ModelRequest) -> Result<ChunkStream, BackendError> {
        let request = to_gemini_request(request, self.config().temperature);
        let stream = self.stream_generate_content(&request).await?;
        Ok(stream.map(|item| item.map_err(BackendError::from)).boxed())
    }
}
