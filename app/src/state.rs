//! Application state
use pillar_core::{Config, GeminiClient, ModelBackend, Result, Workbench, WorkbenchOptions};
use std::sync::Arc;

/// Everything the REPL works on
pub struct AppState {
    pub workbench: Workbench,
    client: Arc<GeminiClient>,
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(GeminiClient::new(
            config.gemini_config(),
            config.api_key.clone(),
        )?);
        let backend = Arc::clone(&client) as Arc<dyn ModelBackend>;

        tracing::info!(model = %client.model(), language = %config.language, "Pillar started");
        Ok(Self::with_backend(config, client, backend))
    }

    /// The workbench talks to `backend`; `client` only holds the credential.
    pub(crate) fn with_backend(
        config: Config,
        client: Arc<GeminiClient>,
        backend: Arc<dyn ModelBackend>,
    ) -> Self {
        let workbench = Workbench::new(
            backend,
            WorkbenchOptions {
                max_document_bytes: config.max_document_bytes,
                language: config.language,
            },
        );

        Self {
            workbench,
            client,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_api_key(&self) -> bool {
        self.client.has_api_key()
    }

    /// Replace the API key. The key stays in memory only.
    pub fn set_api_key(&mut self, key: &str) -> bool {
        self.client.set_api_key(key);
        let present = self.client.has_api_key();
        if present {
            self.workbench.credential_updated();
        }
        present
    }
}
