//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// batchd - priority-ordered, rate-limited batch ingestion
#[derive(Parser)]
#[command(
    name = "batchd",
    about = "Priority-ordered, rate-limited batch ingestion daemon",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server and scheduler
    Serve {
        /// Listen address, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Submit ids to a running server
    Submit {
        /// HIGH, MEDIUM or LOW
        #[arg(short, long, default_value = "MEDIUM")]
        priority: String,

        /// Identifiers to process
        #[arg(required = true, value_name = "ID", allow_negative_numbers = true)]
        ids: Vec<i64>,
    },

    /// Show the status of an ingestion
    Status {
        /// Ingestion id returned by `submit`
        ingestion_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Poll until the ingestion reaches a terminal status
        #[arg(short, long)]
        watch: bool,
    },

    /// Print the effective configuration
    Config,
}

/// Output format for the status command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_submit() {
        let cli = Cli::try_parse_from(["batchd", "submit", "--priority", "high", "1", "2", "3"]).unwrap();
        match cli.command {
            Command::Submit { priority, ids } => {
                assert_eq!(priority, "high");
                assert_eq!(ids, vec![1, 2, 3]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_submit_requires_ids() {
        assert!(Cli::try_parse_from(["batchd", "submit", "--priority", "LOW"]).is_err());
    }

    #[test]
    fn test_parse_status_with_global_flags() {
        let cli = Cli::try_parse_from(["batchd", "status", "abc", "--format", "json", "-v", "-c", "x.yml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.yml")));
        match cli.command {
            Command::Status {
                ingestion_id,
                format,
                watch,
            } => {
                assert_eq!(ingestion_id, "abc");
                assert_eq!(format, OutputFormat::Json);
                assert!(!watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
