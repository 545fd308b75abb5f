//! CLI commands and argument parsing

use crate::loader::AwsSecretsManager;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Settlement report sync
#[derive(Parser, Debug)]
#[command(name = "settlement-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON, tokens resolved)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline configuration JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON), updated after every slice
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Region of the secrets backend
    #[arg(
        long,
        global = true,
        env = "AWS_REGION",
        default_value = AwsSecretsManager::DEFAULT_REGION
    )]
    pub secrets_region: String,

    /// Output format for non-record output
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration specification
    Spec,

    /// Test connection to the API
    Check,

    /// Discover available streams
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,
    },

    /// Resolve `${...}` tokens in a YAML file and print the result
    Resolve {
        /// YAML file to resolve
        file: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

impl Cli {
    /// Stream names selected by `read --streams`
    pub fn selected_streams(&self) -> Vec<String> {
        match &self.command {
            Commands::Read {
                streams: Some(list),
            } => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_with_streams() {
        let cli = Cli::try_parse_from([
            "settlement-sync",
            "read",
            "--streams",
            "summary, events,",
            "--config",
            "config.yaml",
            "--state",
            "state.json",
        ])
        .unwrap();

        assert_eq!(cli.selected_streams(), vec!["summary", "events"]);
        assert_eq!(cli.config, Some(PathBuf::from("config.yaml")));
        assert_eq!(cli.state, Some(PathBuf::from("state.json")));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from(["settlement-sync", "resolve", "secrets.yaml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Resolve { ref file } if file.ends_with("secrets.yaml")));
        assert!(cli.selected_streams().is_empty());
    }

    #[test]
    fn test_explicit_secrets_region() {
        let cli = Cli::try_parse_from([
            "settlement-sync",
            "check",
            "--secrets-region",
            "eu-west-1",
        ])
        .unwrap();
        assert_eq!(cli.secrets_region, "eu-west-1");
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["settlement-sync", "serve"]).is_err());
    }
}
