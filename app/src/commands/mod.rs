//! REPL commands
//!
//! A line starting with `/` is a command. Any other line is a chat
//! message once a document is ready. Before that, only a line naming a
//! `.pdf` file is taken as a path to open.

pub mod chat;
pub mod session;
pub mod settings;

use pillar_core::{Language, ViewMode};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    /// `None` toggles
    Language(Option<Language>),
    /// `None` toggles
    View(Option<ViewMode>),
    Flip(usize),
    Cards,
    New,
    /// `None` prompts for the key
    Key(Option<String>),
    Help,
    About,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Empty,
    Command(Command),
    /// A malformed command, with a usage hint
    Invalid(String),
    Text(String),
}

impl Line {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Line::Empty;
        }
        let Some(without_prefix) = input.strip_prefix('/') else {
            return Line::Text(input.to_string());
        };

        let mut parts = without_prefix.splitn(2, ' ');
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let parsed = match command.as_str() {
            "open" | "o" => match arg {
                Some(path) => Ok(Command::Open(PathBuf::from(path))),
                None => Err("usage: /open <file.pdf>".to_string()),
            },
            "lang" | "language" | "l" => match arg {
                Some(lang) => lang.parse().map(|l| Command::Language(Some(l))),
                None => Ok(Command::Language(None)),
            },
            "view" | "v" => match arg {
                Some(view) => view.parse().map(|v| Command::View(Some(v))),
                None => Ok(Command::View(None)),
            },
            "flip" | "f" => match arg.map(str::parse::<usize>) {
                Some(Ok(n)) if n > 0 => Ok(Command::Flip(n)),
                _ => Err("usage: /flip N (1-6)".to_string()),
            },
            "cards" | "axioms" => Ok(Command::Cards),
            "new" | "reset" => Ok(Command::New),
            "key" => Ok(Command::Key(arg.map(str::to_string))),
            "help" | "h" | "?" => Ok(Command::Help),
            "about" => Ok(Command::About),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("Unknown command: /{other} (try /help)")),
        };

        match parsed {
            Ok(command) => Line::Command(command),
            Err(hint) => Line::Invalid(hint),
        }
    }
}

/// Whether plain input names a PDF to open
fn names_pdf(text: &str) -> bool {
    Path::new(text)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one parsed line against the state
pub async fn handle<W: Write>(state: &mut AppState, line: Line, out: &mut W) -> io::Result<Flow> {
    match line {
        Line::Empty => {}
        Line::Invalid(hint) => writeln!(out, "{hint}")?,
        Line::Text(text) => {
            if state.workbench.is_ready() {
                chat::send(state, &text, out).await?;
            } else if names_pdf(&text) {
                session::open(state, PathBuf::from(text), out).await?;
            } else {
                let s = state.workbench.strings();
                writeln!(out, "{}", s.error_not_ready)?;
                writeln!(out, "{}", s.upload_prompt)?;
            }
        }
        Line::Command(command) => return dispatch(state, command, out).await,
    }
    Ok(Flow::Continue)
}

pub async fn dispatch<W: Write>(
    state: &mut AppState,
    command: Command,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        Command::Open(path) => session::open(state, path, out).await?,
        Command::Language(language) => settings::language(state, language, out)?,
        Command::View(view) => settings::view(state, view, out)?,
        Command::Flip(index) => session::flip(state, index, out)?,
        Command::Cards => session::cards(state, out)?,
        Command::New => session::new_session(state, out)?,
        Command::Key(key) => settings::key(state, key.as_deref().unwrap_or_default(), out)?,
        Command::Help => crate::render::help(out)?,
        Command::About => settings::about(state, out)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::scripted_state;
    use pillar_core::{strings, Phase};
    use pillar_session::testing::ScriptedBackend;
    use std::sync::Arc;

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(Line::parse("   "), Line::Empty);
        assert_eq!(
            Line::parse(" what is the thesis? "),
            Line::Text("what is the thesis?".to_string())
        );
    }

    #[test]
    fn test_parse_language() {
        assert_eq!(
            Line::parse("/lang ar"),
            Line::Command(Command::Language(Some(Language::Ar)))
        );
        assert_eq!(Line::parse("/LANG"), Line::Command(Command::Language(None)));
        assert!(matches!(Line::parse("/lang fr"), Line::Invalid(_)));
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(
            Line::parse("/view document"),
            Line::Command(Command::View(Some(ViewMode::Document)))
        );
        assert_eq!(Line::parse("/v"), Line::Command(Command::View(None)));
    }

    #[test]
    fn test_parse_flip() {
        assert_eq!(Line::parse("/flip 3"), Line::Command(Command::Flip(3)));
        assert!(matches!(Line::parse("/flip"), Line::Invalid(_)));
        assert!(matches!(Line::parse("/flip 0"), Line::Invalid(_)));
        assert!(matches!(Line::parse("/flip x"), Line::Invalid(_)));
    }

    #[test]
    fn test_parse_open_keeps_spaces() {
        assert_eq!(
            Line::parse("/open My Papers/thesis.pdf"),
            Line::Command(Command::Open(PathBuf::from("My Papers/thesis.pdf")))
        );
        assert!(matches!(Line::parse("/open"), Line::Invalid(_)));
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(Line::parse("/key"), Line::Command(Command::Key(None)));
        assert_eq!(
            Line::parse("/key abc123"),
            Line::Command(Command::Key(Some("abc123".to_string())))
        );
    }

    #[test]
    fn test_names_pdf() {
        assert!(names_pdf("papers/Thesis.PDF"));
        assert!(!names_pdf("what is this paper about?"));
        assert!(!names_pdf("notes.txt"));
    }

    #[tokio::test]
    async fn test_text_before_ready_is_not_a_path() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_extraction(Ok("not json".to_string()));
        let mut state = scripted_state(&backend);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        // Drive the workbench into the error phase first
        let mut out = Vec::new();
        let line = Line::Text(path.display().to_string());
        handle(&mut state, line, &mut out).await.unwrap();
        assert_eq!(state.workbench.phase(), Phase::Error);
        assert_eq!(backend.generate_calls(), 1);

        let mut out = Vec::new();
        let line = Line::parse("what is the main claim?");
        assert_eq!(handle(&mut state, line, &mut out).await.unwrap(), Flow::Continue);

        let s = strings(Language::En);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(s.error_not_ready));
        assert!(!text.contains(s.file_missing));
        assert_eq!(backend.generate_calls(), 1);
        assert_eq!(state.workbench.error_banner(), Some(s.error_malformed));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Line::parse("/new"), Line::Command(Command::New));
        assert_eq!(Line::parse("/cards"), Line::Command(Command::Cards));
        assert_eq!(Line::parse("/help"), Line::Command(Command::Help));
        assert_eq!(Line::parse("/about"), Line::Command(Command::About));
        assert_eq!(Line::parse("/quit"), Line::Command(Command::Quit));
        assert!(matches!(Line::parse("/dance"), Line::Invalid(_)));
    }
}
