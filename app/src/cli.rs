//! Command-line arguments

use clap::Parser;
use pillar_core::Language;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pillar", version, about = "Distill a PDF into six axioms and chat with it")]
pub struct Args {
    /// PDF to analyze on startup
    pub file: Option<PathBuf>,

    /// Interface and response language (en, ar)
    #[arg(short, long, value_parser = parse_language)]
    pub lang: Option<Language>,

    /// Configuration file (default: <data dir>/Pillar/config.toml)
    #[arg(short, long, env = "PILLAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model identifier, overrides the configuration
    #[arg(short, long)]
    pub model: Option<String>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["pillar", "paper.pdf", "--lang", "ar", "-v"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("paper.pdf")));
        assert_eq!(args.lang, Some(Language::Ar));
        assert!(args.verbose);
        assert!(args.model.is_none());
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Args::try_parse_from(["pillar", "--lang", "fr"]).is_err());
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
