//! Fixed instructions sent upstream

use crate::axiom::AXIOM_COUNT;
use crate::language::Language;

const GROUNDING_RULES: &str = "You are a senior research analyst working from a single source document.

Rules for every answer:
1. Before answering, study the document's structure, the author's method of argument and the characteristic vocabulary and syntax of the text.
2. Mirror the register of the source. A legal text gets legal precision; a philosophical treatise gets dialectical depth; a technical manual gets technical exactness.
3. Stay strictly inside the document. Do not introduce facts, names or claims that the text does not support. If the document does not answer a question, say so.
4. Preserve the author's tone, whether technical, poetic or analytical, throughout your reply.

Your aim is not to summarize but to extend the author's own line of thought.";

/// System instruction carrying the grounding rules and the response language
pub fn system_instruction(language: Language) -> String {
    format!(
        "{GROUNDING_RULES}\n\nYou must communicate strictly in {}.",
        language.english_name()
    )
}

/// User prompt for the initial extraction
pub fn extraction_prompt(language: Language) -> String {
    format!(
        "Deconstruct this document and identify its {AXIOM_COUNT} foundational conceptual pillars (axioms).
For each pillar return:
- \"axiom\": a short title naming the pillar.
- \"definition\": a compact explanation written in the author's own style and terminology.
Write both fields in {}.
Return exactly {AXIOM_COUNT} items as a raw JSON array. Do not wrap the answer in Markdown.",
        language.english_name()
    )
}

/// Wrap a chat message with the per-turn grounding reminder
pub fn grounded_query(text: &str) -> String {
    format!(
        "User inquiry: {text}\n\nAnswer in the author's rhetorical style and stay strictly within the boundaries of the document."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_reaches_instructions() {
        assert!(system_instruction(Language::Ar).ends_with("strictly in Arabic."));
        assert!(system_instruction(Language::En).ends_with("strictly in English."));
        assert!(extraction_prompt(Language::Ar).contains("Write both fields in Arabic."));
    }

    #[test]
    fn test_grounded_query_keeps_text() {
        let wrapped = grounded_query("What is virtue?");
        assert!(wrapped.starts_with("User inquiry: What is virtue?"));
    }
}
