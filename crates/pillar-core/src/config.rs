//! Application configuration

use pillar_gemini::GeminiConfig;
use pillar_session::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

/// Checked in order; the first non-empty value wins
const API_KEY_VARS: &[&str] = &["PILLAR_API_KEY", "GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credential for the model API
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// API scheme and host
    pub api_base: String,
    /// Sampling temperature (server default when unset)
    pub temperature: Option<f32>,
    /// Timeout for the extraction call
    pub request_timeout_secs: u64,
    /// Maximum silence while streaming a reply
    pub stream_idle_timeout_secs: u64,
    /// Upload size limit
    pub max_document_bytes: u64,
    /// Initial interface and response language
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            temperature: None,
            request_timeout_secs: 120,
            stream_idle_timeout_secs: 300,
            max_document_bytes: 20 * 1024 * 1024,
            language: Language::En,
        }
    }
}

impl Config {
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Pillar"))
            .unwrap_or_else(|| PathBuf::from(".pillar"))
    }

    pub fn default_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load from `path` (which must exist) or from the default location
    /// (which may be absent), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path();
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        let config = toml::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Override fields from the environment through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_VARS.iter().find_map(|name| non_empty(name)) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = non_empty("PILLAR_MODEL") {
            self.model = model.trim().to_string();
        }
        if let Some(base) = non_empty("PILLAR_API_BASE") {
            self.api_base = base.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api_base)
            .map_err(|e| CoreError::Config(format!("api_base {:?}: {}", self.api_base, e)))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(CoreError::Config(format!(
                "api_base must be http(s), got {}",
                base.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(CoreError::Config("model cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 || self.stream_idle_timeout_secs == 0 {
            return Err(CoreError::Config("timeouts must be positive".to_string()));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(CoreError::Config(format!(
                    "temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        if self.max_document_bytes == 0 {
            return Err(CoreError::Config(
                "max_document_bytes must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_base: self.api_base.clone(),
            model: self.model.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            stream_idle_timeout: Duration::from_secs(self.stream_idle_timeout_secs),
            temperature: self.temperature,
        }
    }
}
