//! Document and session commands

use std::io::{self, Write};
use std::path::PathBuf;

use crate::render;
use crate::state::AppState;

/// Analyze a PDF, printing progress while it runs
pub async fn open<W: Write>(state: &mut AppState, path: PathBuf, out: &mut W) -> io::Result<()> {
    let s = state.workbench.strings();
    let mut phases = state.workbench.subscribe();

    let result = {
        let upload = state.workbench.upload(&path);
        tokio::pin!(upload);
        let mut watching = true;
        loop {
            tokio::select! {
                // Report every pending transition before the upload can finish
                biased;
                changed = phases.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    let phase = *phases.borrow_and_update();
                    if let Some(line) = render::phase_line(phase, s) {
                        writeln!(out, "{line}")?;
                        out.flush()?;
                    }
                }
                result = &mut upload => break result,
            }
        }
    };

    match result {
        Ok(()) => {
            writeln!(out, "{}", s.ready)?;
            render::view(out, &state.workbench)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), "Open failed: {}", e);
            render::banner(out, &state.workbench)
        }
    }
}

pub fn new_session<W: Write>(state: &mut AppState, out: &mut W) -> io::Result<()> {
    state.workbench.new_session();
    writeln!(out, "{}", state.workbench.strings().new_session)
}

pub fn flip<W: Write>(state: &mut AppState, index: usize, out: &mut W) -> io::Result<()> {
    let language = state.workbench.language();
    let s = state.workbench.strings();
    if state.workbench.cards().is_empty() {
        return writeln!(out, "{}", s.error_not_ready);
    }
    match state.workbench.flip_card(index) {
        Some(card) => render::card(out, card, language),
        None => writeln!(out, "{}", s.flip_hint),
    }
}

pub fn cards<W: Write>(state: &AppState, out: &mut W) -> io::Result<()> {
    if state.workbench.cards().is_empty() {
        return writeln!(out, "{}", state.workbench.strings().error_not_ready);
    }
    render::cards(out, &state.workbench)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::scripted_state;
    use pillar_core::{strings, Language, Phase};
    use pillar_session::testing::{sample_axioms_json, ScriptedBackend};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_and_reset() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Ok(sample_axioms_json()));
        let mut state = scripted_state(&backend);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let mut out = Vec::new();
        open(&mut state, path, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(strings(Language::En).ready));
        assert!(text.contains("Pillar 6"));
        assert_eq!(state.workbench.phase(), Phase::Ready);

        let mut out = Vec::new();
        flip(&mut state, 1, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Explanation of pillar 1."));

        let mut out = Vec::new();
        new_session(&mut state, &mut out).unwrap();
        assert_eq!(state.workbench.phase(), Phase::Idle);
        assert!(state.workbench.cards().is_empty());
    }

    #[tokio::test]
    async fn test_open_prints_progress() {
        let backend = Arc::new(ScriptedBackend::new());
        let release = backend.push_gated_extraction(Ok(sample_axioms_json()));
        let mut state = scripted_state(&backend);
        let mut phases = state.workbench.subscribe();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let mut out = Vec::new();
        let (result, ()) = tokio::join!(open(&mut state, path, &mut out), async {
            phases
                .wait_for(|phase| *phase == Phase::Analyzing)
                .await
                .unwrap();
            release.send(()).unwrap();
        });
        result.unwrap();

        let text = String::from_utf8(out).unwrap();
        let s = strings(Language::En);
        let analyzing = text.find(s.analyzing).expect("analyzing line");
        let ready = text.find(s.ready).expect("ready line");
        assert!(analyzing < ready);
        assert_eq!(state.workbench.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_open_non_pdf_shows_banner() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut state = scripted_state(&backend);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, b"PK").unwrap();

        let mut out = Vec::new();
        open(&mut state, path, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(strings(Language::En).invalid_pdf));
        assert_eq!(backend.generate_calls(), 0);
    }
}
