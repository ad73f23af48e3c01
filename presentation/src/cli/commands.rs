//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for consultation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every seat's answer followed by the synthesis
    Full,
    /// Only the synthesis
    Synthesis,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => Self::Full,
            OutputFormat::Synthesis => Self::Synthesis,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// CLI arguments for council
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about = "Ask several LLMs the same question and compare their answers")]
#[command(long_about = r#"
Council sends one question to every configured seat concurrently, tolerates
seats that fail, and reports where the answers agree, where they conflict,
and each seat's densest insight. The synthesis is computed locally; no extra
model call is made.

A seat is one model family with ordered fallback candidates. Candidates that
fail are skipped for a cooldown window before being retried.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/council/config.toml   Global config

Example:
  council "Should this service use MongoDB or Postgres?"
  council -s gpt-4o -s claude-sonnet-4.5 "Compare async runtimes"
  council --ask claude -a schema.sql "Review this schema"
"#)]
pub struct Cli {
    /// The question to put to the council
    pub question: Option<String>,

    /// Ad-hoc seats, one HTTP model each (replaces configured seats)
    #[arg(short, long, value_name = "MODEL")]
    pub seat: Vec<String>,

    /// Stream the answer of a single seat instead of consulting all of them
    #[arg(long, value_name = "SEAT")]
    pub ask: Option<String>,

    /// Files to attach to the question (can be specified multiple times)
    #[arg(short, long, value_name = "PATH")]
    pub attach: Vec<PathBuf>,

    /// Output format [default: synthesis, or [output] format from config]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "council",
            "-s",
            "gpt-4o",
            "--seat",
            "claude-sonnet-4.5",
            "-a",
            "schema.sql",
            "-o",
            "json",
            "-vv",
            "Which database?",
        ])
        .unwrap();

        assert_eq!(cli.question.as_deref(), Some("Which database?"));
        assert_eq!(cli.seat, vec!["gpt-4o", "claude-sonnet-4.5"]);
        assert_eq!(cli.attach, vec![PathBuf::from("schema.sql")]);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["council", "q"]).unwrap();
        assert!(cli.seat.is_empty());
        assert!(cli.ask.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.no_config);
    }

    #[test]
    fn test_ask_mode() {
        let cli = Cli::try_parse_from(["council", "--ask", "claude", "q"]).unwrap();
        assert_eq!(cli.ask.as_deref(), Some("claude"));
    }

    #[test]
    fn test_format_conversion() {
        assert_eq!(
            council_domain::OutputFormat::from(OutputFormat::Full),
            council_domain::OutputFormat::Full
        );
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
