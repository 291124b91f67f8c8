//! Pillar Core
//!
//! Coordination layer between the front end and the session manager.
//! The front end renders `Workbench` state; it owns none of its own.

mod config;
mod error;
mod flashcard;
mod i18n;
mod transcript;
mod upload;
mod workbench;

pub use config::Config;
pub use error::{CoreError, ValidationError};
pub use flashcard::Flashcard;
pub use i18n::{strings, Strings};
pub use transcript::{Message, Role, Transcript};
pub use upload::{display_name, read_pdf, validate_path, DocumentPreview, Upload, PDF_SIGNATURE};
pub use workbench::{DocumentSummary, Phase, ViewMode, Workbench, WorkbenchOptions};

// Re-export session and client types the front end needs
pub use pillar_gemini::{GeminiClient, GeminiConfig, GeminiError};
pub use pillar_session::{
    Axiom, Document, Language, ModelBackend, SessionError, SessionInfo, SessionManager,
    SessionState,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. Output goes to stderr so it never interleaves with
/// the transcript on stdout.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
