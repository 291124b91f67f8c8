//! HTTP client for the Generative Language API

use parking_lot::RwLock;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;

use crate::error::GeminiError;
use crate::stream::{text_stream, TextStream};
use crate::types::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::Result;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Scheme and host, e.g. `https://generativelanguage.googleapis.com`
    pub api_base: String,
    /// Model identifier, e.g. `gemini-2.5-flash`
    pub model: String,
    /// Upper bound for a non-streaming call
    pub request_timeout: Duration,
    /// Maximum silence between two SSE events
    pub stream_idle_timeout: Duration,
    /// Sampling temperature; `None` keeps the server default
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            request_timeout: Duration::from_secs(120),
            stream_idle_timeout: Duration::from_secs(300),
            temperature: None,
        }
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
    /// Replaceable at runtime when the user re-selects a key
    api_key: RwLock<Option<String>>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .user_agent(concat!("pillar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config,
            api_key: RwLock::new(api_key.filter(|k| !k.trim().is_empty())),
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.read().is_some()
    }

    pub fn set_api_key(&self, key: impl Into<String>) {
        let key = key.into();
        let key = key.trim();
        *self.api_key.write() = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
        tracing::info!(present = self.has_api_key(), "API key updated");
    }

    fn api_key(&self) -> Result<String> {
        self.api_key.read().clone().ok_or(GeminiError::MissingApiKey)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// Single-shot generation
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let key = self.api_key()?;
        let url = self.endpoint("generateContent");

        tracing::debug!(model = %self.config.model, turns = request.contents.len(), "generateContent");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, key)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .timeout(self.config.request_timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(usage) = parsed.usage_metadata.as_ref() {
            tracing::debug!(
                prompt_tokens = ?usage.prompt_token_count,
                output_tokens = ?usage.candidates_token_count,
                "generateContent usage"
            );
        }

        if let Some(reason) = parsed.block_reason() {
            return Err(GeminiError::Blocked(reason));
        }

        Ok(parsed)
    }

    /// Streaming generation. Errors before the first byte are returned
    /// directly; later failures arrive as items of the stream.
    pub async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<TextStream> {
        let key = self.api_key()?;
        let url = self.endpoint("streamGenerateContent");

        tracing::debug!(model = %self.config.model, turns = request.contents.len(), "streamGenerateContent");

        let idle = self.config.stream_idle_timeout;
        let send = self
            .http
            .post(&url)
            .query(&[("alt", "sse")])
            .header(API_KEY_HEADER, key)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(request)
            .send();

        // The idle bound also covers the wait for response headers
        let response = tokio::time::timeout(idle, send)
            .await
            .map_err(|_| GeminiError::IdleTimeout(idle))??;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(text_stream(
            response.bytes_stream(),
            self.config.stream_idle_timeout,
        ))
    }
}

async fn error_from_response(response: reqwest::Response) -> GeminiError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return GeminiError::Http(e),
    };

    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => GeminiError::from_api_body(status, envelope.error),
        Err(_) => GeminiError::Api {
            status,
            code: None,
            message: if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body
            },
        },
    }
}
