//! Axiom extraction result and its parser

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::Result;

/// Number of axioms a successful extraction produces
pub const AXIOM_COUNT: usize = 6;

/// One extracted thematic pillar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axiom {
    pub title: String,
    pub explanation: String,
}

/// Shape requested from the model
#[derive(Deserialize)]
struct WireAxiom {
    axiom: String,
    definition: String,
}

/// Response schema for the extraction call (OpenAPI subset)
pub fn axiom_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "axiom": {
                    "type": "STRING",
                    "description": "The conceptual title derived from the text."
                },
                "definition": {
                    "type": "STRING",
                    "description": "A summary that mirrors the author's style and terminology."
                }
            },
            "required": ["axiom", "definition"]
        }
    })
}

/// Strip wrapping artifacts the model sometimes adds around JSON:
/// a byte order mark, surrounding whitespace and Markdown code fences
/// (with or without an info string such as `json`).
pub fn normalize(raw: &str) -> &str {
    let mut text = raw.trim_start_matches('\u{feff}').trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Parse the extraction answer into exactly [`AXIOM_COUNT`] axioms
pub fn parse_axioms(raw: &str) -> Result<Vec<Axiom>> {
    let cleaned = normalize(raw);
    if cleaned.is_empty() {
        return Err(SessionError::MalformedResponse(
            "model returned an empty answer".to_string(),
        ));
    }

    let wire: Vec<WireAxiom> = serde_json::from_str(cleaned)
        .map_err(|e| SessionError::MalformedResponse(e.to_string()))?;

    if wire.len() < AXIOM_COUNT {
        return Err(SessionError::MalformedResponse(format!(
            "expected {} axioms, got {}",
            AXIOM_COUNT,
            wire.len()
        )));
    }
    if wire.len() > AXIOM_COUNT {
        tracing::warn!(
            received = wire.len(),
            kept = AXIOM_COUNT,
            "Model returned extra axioms; truncating"
        );
    }

    let axioms: Vec<Axiom> = wire
        .into_iter()
        .take(AXIOM_COUNT)
        .map(|w| Axiom {
            title: w.axiom.trim().to_string(),
            explanation: w.definition.trim().to_string(),
        })
        .collect();

    if let Some(idx) = axioms
        .iter()
        .position(|a| a.title.is_empty() || a.explanation.is_empty())
    {
        return Err(SessionError::MalformedResponse(format!(
            "axiom {} has an empty field",
            idx + 1
        )));
    }

    Ok(axioms)
}
