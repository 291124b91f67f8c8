//! Pillar - terminal front end
//!
//! The REPL renders `Workbench` state and forwards input to it.
//! The core owns all state.

mod cli;
mod commands;
mod render;
mod state;

pub use cli::Args;

use commands::{Command, Flow, Line};
use pillar_core::Config;
use state::AppState;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

pub async fn run(args: Args) -> anyhow::Result<()> {
    pillar_core::init_logging(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model = model;
        config.validate()?;
    }
    if let Some(language) = args.lang {
        config.language = language;
    }

    let mut state = AppState::new(config)?;
    let mut stdout = std::io::stdout();
    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    render::welcome(&mut stdout, state.workbench.strings())?;

    if !state.has_api_key() {
        let Some(key) = read_key(&state, &mut input, &mut stdout).await? else {
            return Ok(());
        };
        commands::settings::key(&mut state, &key, &mut stdout)?;
    }

    if let Some(file) = args.file {
        commands::dispatch(&mut state, Command::Open(file), &mut stdout).await?;
    }

    loop {
        render::prompt(&mut stdout, &state.workbench)?;
        let Some(raw) = input.next_line().await? else {
            break;
        };

        let line = match Line::parse(&raw) {
            Line::Command(Command::Key(None)) => {
                match read_key(&state, &mut input, &mut stdout).await? {
                    Some(key) => Line::Command(Command::Key(Some(key))),
                    None => break,
                }
            }
            line => line,
        };

        if commands::handle(&mut state, line, &mut stdout).await? == Flow::Quit {
            break;
        }
    }

    tracing::info!("Pillar exiting");
    Ok(())
}

/// Prompt for an API key. `None` on end of input.
async fn read_key<W: Write>(
    state: &AppState,
    input: &mut Input,
    out: &mut W,
) -> std::io::Result<Option<String>> {
    write!(out, "{}", state.workbench.strings().credential_prompt)?;
    out.flush()?;
    Ok(input.next_line().await?.map(|key| key.trim().to_string()))
}
