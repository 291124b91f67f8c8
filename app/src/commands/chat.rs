//! Chat command

use std::io::{self, Write};

use crate::render;
use crate::state::AppState;

/// Send `text` and print the reply as it streams in
pub async fn send<W: Write>(state: &mut AppState, text: &str, out: &mut W) -> io::Result<()> {
    if !state.workbench.is_ready() {
        return writeln!(out, "{}", state.workbench.strings().error_not_ready);
    }

    write!(out, "pillar: ")?;
    out.flush()?;

    let mut printed = 0;
    let mut write_error = None;
    let result = state
        .workbench
        .send_message(text, |message| {
            let delta = &message.text[printed..];
            printed = message.text.len();
            if let Err(e) = write!(out, "{delta}").and_then(|_| out.flush()) {
                if write_error.is_none() {
                    write_error = Some(e);
                }
            }
        })
        .await;
    writeln!(out)?;
    if let Some(e) = write_error {
        return Err(e);
    }

    let language = state.workbench.language();
    let failed = state.workbench.transcript().last().filter(|m| m.failure);
    if let Some(note) = failed {
        render::message(out, note, language)?;
    }
    if let Err(e) = result {
        tracing::debug!("Chat message failed: {}", e);
        if state.workbench.credential_required() {
            render::banner(out, &state.workbench)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::scripted_state;
    use pillar_core::{strings, Language};
    use pillar_session::testing::{sample_axioms_json, Reply, ScriptedBackend};
    use pillar_session::BackendError;
    use std::sync::Arc;

    async fn ready_state(backend: &Arc<ScriptedBackend>) -> (AppState, tempfile::TempDir) {
        backend.push_extraction(Ok(sample_axioms_json()));
        let mut state = scripted_state(backend);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        state.workbench.upload(&path).await.unwrap();
        (state, dir)
    }

    #[tokio::test]
    async fn test_streamed_reply_printed() {
        let backend = Arc::new(ScriptedBackend::new());
        let (mut state, _dir) = ready_state(&backend).await;
        backend.push_reply(Reply::chunks(&["Hel", "lo"]));

        let mut out = Vec::new();
        send(&mut state, "hi", &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "pillar: Hello\n");
    }

    #[tokio::test]
    async fn test_failure_note_printed() {
        let backend = Arc::new(ScriptedBackend::new());
        let (mut state, _dir) = ready_state(&backend).await;
        backend.push_reply(Reply::chunks_then_error(
            &["Par"],
            BackendError::Upstream("reset".to_string()),
        ));

        let mut out = Vec::new();
        send(&mut state, "hi", &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("pillar: Par\n"));
        assert!(text.contains(&format!("!: {}", strings(Language::En).reply_failed)));
    }

    #[tokio::test]
    async fn test_not_ready() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut state = scripted_state(&backend);

        let mut out = Vec::new();
        send(&mut state, "hi", &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim(),
            strings(Language::En).error_not_ready
        );
    }
}
