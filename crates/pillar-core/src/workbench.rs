//! Workbench: the view controller
//!
//! Owns the session manager and everything the front end renders: the
//! phase, the axiom cards, the transcript and the error banner. Every
//! failure is turned into a localized message here.

use futures_util::StreamExt;
use pillar_session::{Language, ModelBackend, SessionError, SessionInfo, SessionManager};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{CoreError, ValidationError};
use crate::flashcard::Flashcard;
use crate::i18n::{strings, Strings};
use crate::transcript::{Message, Transcript};
use crate::upload::{display_name, read_pdf, validate_path, Upload};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Uploading,
    Analyzing,
    Ready,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Analyzing => "analyzing",
            Phase::Ready => "ready",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Research,
    Document,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Research => "research",
            ViewMode::Document => "document",
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" | "chat" | "r" => Ok(ViewMode::Research),
            "document" | "doc" | "pdf" | "d" => Ok(ViewMode::Document),
            other => Err(format!("Unknown view: {}", other)),
        }
    }
}

/// What the document view shows
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub info: SessionInfo,
    pub preview_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct WorkbenchOptions {
    pub max_document_bytes: u64,
    pub language: Language,
}

impl Default for WorkbenchOptions {
    fn default() -> Self {
        Self {
            max_document_bytes: 20 * 1024 * 1024,
            language: Language::En,
        }
    }
}

pub struct Workbench {
    session: SessionManager,
    phase: watch::Sender<Phase>,
    view: ViewMode,
    language: Language,
    cards: Vec<Flashcard>,
    transcript: Transcript,
    banner: Option<String>,
    credential_required: bool,
    upload: Option<Upload>,
    max_document_bytes: u64,
}

impl Workbench {
    pub fn new(backend: Arc<dyn ModelBackend>, options: WorkbenchOptions) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            session: SessionManager::new(backend),
            phase,
            view: ViewMode::Research,
            language: options.language,
            cards: Vec::new(),
            transcript: Transcript::new(),
            banner: None,
            credential_required: false,
            upload: None,
            max_document_bytes: options.max_document_bytes,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Observe phase transitions
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn strings(&self) -> &'static Strings {
        strings(self.language)
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn credential_required(&self) -> bool {
        self.credential_required
    }

    pub fn preview_path(&self) -> Option<&Path> {
        self.upload
            .as_ref()
            .and_then(|u| u.preview.as_ref())
            .map(|p| p.path())
    }

    pub fn document_summary(&self) -> Option<DocumentSummary> {
        self.session.session_info().map(|info| DocumentSummary {
            info,
            preview_path: self.preview_path().map(Path::to_path_buf),
        })
    }

    fn set_phase(&self, phase: Phase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            tracing::debug!(from = %previous, to = %phase, "Phase changed");
        }
    }

    /// Validate, read and analyze one PDF.
    pub async fn upload(&mut self, path: &Path) -> Result<()> {
        let s = self.strings();

        if self.is_ready() {
            self.banner = Some(s.error_session_active.to_string());
            return Err(CoreError::SessionActive);
        }

        if let Err(e) = validate_path(path, self.max_document_bytes).await {
            return Err(self.reject(e));
        }

        self.set_phase(Phase::Uploading);
        let bytes = match read_pdf(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.set_phase(Phase::Idle);
                return Err(self.reject(e));
            }
        };

        let upload = match Upload::prepare(display_name(path), bytes).await {
            Ok(upload) => upload,
            Err(e) => {
                tracing::warn!("Could not prepare upload: {}", e);
                self.set_phase(Phase::Idle);
                self.banner = Some(s.file_unreadable.to_string());
                return Err(e);
            }
        };
        let document = upload.document.clone();
        self.banner = None;
        self.set_phase(Phase::Analyzing);

        match self.session.initialize(document, self.language).await {
            Ok(axioms) => {
                self.cards = Flashcard::deck(&axioms);
                self.transcript.clear();
                self.transcript.push_assistant(s.greeting);
                self.upload = Some(upload);
                self.view = ViewMode::Research;
                self.credential_required = false;
                self.set_phase(Phase::Ready);
                Ok(())
            }
            Err(e) => {
                // Dropping the upload removes its preview file
                drop(upload);
                self.fail(&e);
                self.set_phase(Phase::Error);
                Err(e.into())
            }
        }
    }

    fn reject(&mut self, e: ValidationError) -> CoreError {
        let s = self.strings();
        tracing::info!("Upload rejected: {}", e);
        let message = match &e {
            ValidationError::MissingFile(_) => s.file_missing,
            ValidationError::NotPdf(_) => s.invalid_pdf,
            ValidationError::TooLarge { .. } => s.file_too_large,
            ValidationError::Unreadable(_) => s.file_unreadable,
        };
        self.banner = Some(message.to_string());
        e.into()
    }

    /// Localized banner text for a session failure
    fn describe(&self, e: &SessionError) -> &'static str {
        let s = self.strings();
        match e {
            SessionError::AuthenticationRequired(_) => s.error_credential,
            SessionError::Upstream(_) => s.error_connection,
            SessionError::MalformedResponse(_) => s.error_malformed,
            SessionError::NotInitialized => s.error_not_ready,
            SessionError::Busy => s.error_busy,
            SessionError::EmptyQuery => s.reply_failed,
        }
    }

    fn fail(&mut self, e: &SessionError) {
        match e {
            SessionError::NotInitialized => tracing::error!("{}", e),
            _ => tracing::warn!("{}", e),
        }
        if e.requires_authentication() {
            self.credential_required = true;
        }
        self.banner = Some(self.describe(e).to_string());
    }

    /// Send a chat message and stream the reply into the transcript.
    ///
    /// Ignored when `text` is blank or no document is ready. `on_update`
    /// sees the assistant message after each chunk.
    pub async fn send_message<F>(&mut self, text: &str, mut on_update: F) -> Result<()>
    where
        F: FnMut(&Message),
    {
        let text = text.trim();
        if text.is_empty() || !self.is_ready() {
            return Ok(());
        }

        self.transcript.push_user(text);
        self.transcript.begin_reply();

        let mut stream = match self.session.query(text).await {
            Ok(stream) => stream,
            Err(e) => {
                self.reply_failed(&e);
                return Err(e.into());
            }
        };

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(message) = self.transcript.append_to_last(&chunk) {
                        on_update(message);
                    }
                }
                Err(e) => {
                    self.reply_failed(&e);
                    return Err(e.into());
                }
            }
        }

        if stream.chunk_count() == 0 {
            self.transcript.discard_empty_reply();
            self.transcript.push_failure_note(self.strings().reply_failed);
        }

        Ok(())
    }

    fn reply_failed(&mut self, e: &SessionError) {
        self.transcript.discard_empty_reply();
        let note = match e {
            SessionError::AuthenticationRequired(_) | SessionError::Busy => self.describe(e),
            _ => self.strings().reply_failed,
        };
        self.transcript.push_failure_note(note);

        match e {
            SessionError::AuthenticationRequired(_) => self.fail(e),
            _ => tracing::warn!("Reply failed: {}", e),
        }
    }

    /// Discard the session and return to `Idle`. Idempotent.
    pub fn new_session(&mut self) {
        self.session.reset();
        self.cards.clear();
        self.transcript.clear();
        self.banner = None;
        self.upload = None;
        self.view = ViewMode::Research;
        self.set_phase(Phase::Idle);
    }

    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            tracing::info!(language = %language, "Language changed");
        }
        self.language = language;
    }

    pub fn toggle_language(&mut self) -> Language {
        self.set_language(self.language.toggled());
        self.language
    }

    /// Switch view. Returns false unless a document is ready.
    pub fn set_view(&mut self, view: ViewMode) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.view = view;
        true
    }

    /// Flip card `index` (1-based)
    pub fn flip_card(&mut self, index: usize) -> Option<&Flashcard> {
        let card = self.cards.get_mut(index.checked_sub(1)?)?;
        card.flip();
        Some(card)
    }

    /// Call after a new API key was supplied
    pub fn credential_updated(&mut self) {
        self.credential_required = false;
        self.banner = None;
        if self.phase() == Phase::Error {
            self.set_phase(Phase::Idle);
        }
    }
}
