//! Pillar Session Management
//!
//! - At most one active session, bound to exactly one document
//! - `initialize` extracts six axioms and seeds the grounding context
//! - `query` yields a lazy, ordered stream of reply chunks
//! - `reset` discards session and document together

mod axiom;
mod backend;
mod document;
mod error;
mod language;
mod manager;
mod prompts;
mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use axiom::{axiom_schema, normalize, parse_axioms, Axiom, AXIOM_COUNT};
pub use backend::{BackendError, ChunkStream, ModelBackend, ModelRequest, Role, Turn, TurnPart};
pub use document::{Document, PDF_MIME_TYPE};
pub use error::SessionError;
pub use language::Language;
pub use manager::{ReplyStream, SessionManager};
pub use session::{SessionInfo, SessionState};

pub type Result<T> = std::result::Result<T, SessionError>;
