//! Active session data

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::axiom::Axiom;
use crate::backend::{ModelRequest, Role, Turn, TurnPart};
use crate::document::Document;
use crate::language::Language;
use crate::prompts;

/// Session Manager lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Uninitialized,
    Active,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Active => "active",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only snapshot of the active session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub document_name: String,
    pub document_bytes: usize,
    pub fingerprint: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    /// Completed question/answer exchanges after extraction
    pub exchanges: usize,
}

/// Document, axioms and grounding history bound together
pub(crate) struct ActiveSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub document: Document,
    pub language: Language,
    pub axioms: Vec<Axiom>,
    history: Vec<Turn>,
}

impl ActiveSession {
    /// The extraction exchange becomes the first two turns, so the document
    /// stays in context for every later query.
    pub fn new(
        document: Document,
        language: Language,
        axioms: Vec<Axiom>,
        extraction_answer: &str,
    ) -> Self {
        let history = vec![
            extraction_turn(&document, language),
            Turn::model_text(extraction_answer),
        ];

        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            document,
            language,
            axioms,
            history,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn exchanges(&self) -> usize {
        self.history.len().saturating_sub(2) / 2
    }

    /// Full history plus the new user turn
    pub fn request_for(&self, text: &str) -> ModelRequest {
        let mut turns = self.history.clone();
        turns.push(Turn::user_text(prompts::grounded_query(text)));

        ModelRequest {
            system_instruction: prompts::system_instruction(self.language),
            turns,
            response_schema: None,
        }
    }

    pub fn commit(&mut self, text: &str, reply: String) {
        self.history
            .push(Turn::user_text(prompts::grounded_query(text)));
        self.history.push(Turn::model_text(reply));
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            document_name: self.document.name().to_string(),
            document_bytes: self.document.byte_len(),
            fingerprint: self.document.fingerprint().to_string(),
            language: self.language,
            created_at: self.created_at,
            exchanges: self.exchanges(),
        }
    }
}

/// User turn for the extraction call: instruction followed by the document
pub(crate) fn extraction_turn(document: &Document, language: Language) -> Turn {
    Turn {
        role: Role::User,
        parts: vec![
            TurnPart::Text(prompts::extraction_prompt(language)),
            TurnPart::Document {
                mime_type: document.mime_type(),
                data: document.shared_data(),
            },
        ],
    }
}
