//! Terminal rendering of workbench state

use pillar_core::{Flashcard, Language, Message, Phase, Role, Strings, ViewMode, Workbench};
use std::io::{self, Write};

/// Right-to-left mark so Arabic lines lay out correctly
const RLM: &str = "\u{200F}";

fn lead(language: Language) -> &'static str {
    if language.is_rtl() {
        RLM
    } else {
        ""
    }
}

pub fn welcome<W: Write>(out: &mut W, s: &Strings) -> io::Result<()> {
    writeln!(out, "{}: {}", s.app_title, s.tagline)?;
    writeln!(out, "{}", s.upload_prompt)?;
    writeln!(out, "/help")
}

pub fn prompt<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    match workbench.phase() {
        Phase::Ready => write!(out, "pillar:{}> ", workbench.view().as_str())?,
        _ => write!(out, "pillar> ")?,
    }
    out.flush()
}

/// Progress line for transient phases
pub fn phase_line(phase: Phase, s: &Strings) -> Option<&'static str> {
    match phase {
        Phase::Uploading => Some(s.uploading),
        Phase::Analyzing => Some(s.analyzing),
        _ => None,
    }
}

pub fn banner<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    if let Some(banner) = workbench.error_banner() {
        writeln!(out, "{}! {}", lead(workbench.language()), banner)?;
    }
    Ok(())
}

pub fn card<W: Write>(out: &mut W, card: &Flashcard, language: Language) -> io::Result<()> {
    let marker = if card.flipped { "*" } else { " " };
    writeln!(out, "{}[{}]{} {}", lead(language), card.index, marker, card.face())
}

pub fn cards<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    let s = workbench.strings();
    writeln!(out, "{}== {} ==", lead(workbench.language()), s.axioms_heading)?;
    for c in workbench.cards() {
        card(out, c, workbench.language())?;
    }
    writeln!(out, "{}{}", lead(workbench.language()), s.flip_hint)
}

pub fn message<W: Write>(out: &mut W, message: &Message, language: Language) -> io::Result<()> {
    let speaker = match (message.role, message.failure) {
        (_, true) => "!",
        (Role::User, false) => "you",
        (Role::Assistant, false) => "pillar",
    };
    writeln!(out, "{}{}: {}", lead(language), speaker, message.text)
}

pub fn transcript<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    writeln!(
        out,
        "{}== {} ==",
        lead(workbench.language()),
        workbench.strings().chat_heading
    )?;
    for m in workbench.transcript().messages() {
        message(out, m, workbench.language())?;
    }
    Ok(())
}

pub fn document<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    let s = workbench.strings();
    writeln!(out, "{}== {} ==", lead(workbench.language()), s.document_heading)?;

    let Some(summary) = workbench.document_summary() else {
        return writeln!(out, "{}", s.error_not_ready);
    };
    let info = &summary.info;
    writeln!(out, "name:        {}", info.document_name)?;
    writeln!(out, "size:        {} bytes", info.document_bytes)?;
    writeln!(out, "sha256:      {}", info.fingerprint)?;
    writeln!(out, "session:     {}", info.id)?;
    writeln!(out, "language:    {}", info.language.native_name())?;
    writeln!(out, "opened:      {}", info.created_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "exchanges:   {}", info.exchanges)?;
    match summary.preview_path {
        Some(path) => writeln!(out, "preview:     {}", path.display()),
        None => Ok(()),
    }
}

/// The current view in full
pub fn view<W: Write>(out: &mut W, workbench: &Workbench) -> io::Result<()> {
    match workbench.view() {
        ViewMode::Research => {
            cards(out, workbench)?;
            transcript(out, workbench)
        }
        ViewMode::Document => document(out, workbench),
    }
}

pub fn help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "  <file.pdf>              open a document (before analysis)")?;
    writeln!(out, "  /open <file.pdf>        open a document")?;
    writeln!(out, "  /cards                  show the axiom cards")?;
    writeln!(out, "  /flip N                 flip card N")?;
    writeln!(out, "  /view [research|document]  switch view")?;
    writeln!(out, "  /lang [en|ar]           switch language")?;
    writeln!(out, "  /key [value]            enter an API key")?;
    writeln!(out, "  /new                    start a new session")?;
    writeln!(out, "  /about                  about Pillar")?;
    writeln!(out, "  /quit                   exit")?;
    writeln!(out, "  anything else           ask about the document")
}
