//! Settings commands

use pillar_core::{Language, ViewMode};
use std::io::{self, Write};

use crate::render;
use crate::state::AppState;

pub fn language<W: Write>(
    state: &mut AppState,
    language: Option<Language>,
    out: &mut W,
) -> io::Result<()> {
    match language {
        Some(language) => state.workbench.set_language(language),
        None => {
            state.workbench.toggle_language();
        }
    }
    writeln!(out, "{}", state.workbench.strings().language_switched)
}

pub fn view<W: Write>(state: &mut AppState, view: Option<ViewMode>, out: &mut W) -> io::Result<()> {
    let target = view.unwrap_or(match state.workbench.view() {
        ViewMode::Research => ViewMode::Document,
        ViewMode::Document => ViewMode::Research,
    });

    if !state.workbench.set_view(target) {
        return writeln!(out, "{}", state.workbench.strings().view_unavailable);
    }
    render::view(out, &state.workbench)
}

pub fn key<W: Write>(state: &mut AppState, key: &str, out: &mut W) -> io::Result<()> {
    let s = state.workbench.strings();
    if state.set_api_key(key) {
        writeln!(out, "{}", s.credential_saved)
    } else {
        writeln!(out, "{}", s.error_credential)
    }
}

pub fn about<W: Write>(state: &AppState, out: &mut W) -> io::Result<()> {
    let s = state.workbench.strings();
    writeln!(out, "{} {}", s.app_title, env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "{}", s.about)?;
    writeln!(out, "model: {}", state.config().model)
}
