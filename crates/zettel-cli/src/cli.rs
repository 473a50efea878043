use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use zettel_config::{DuplicatePolicy, HashAlgorithm};
use zettel_core::ZkCommand;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON for scripts
    Json,
}

#[derive(Parser)]
#[command(name = "zk")]
#[command(about = "zk - keep a markdown vault on the zettelkasten prefix convention")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root (defaults to config `vault.path`, then the current directory)
    #[arg(long, global = true, env = "ZETTEL_VAULT")]
    pub vault: Option<PathBuf>,

    /// Config file path (defaults to ~/.config/zettel/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prefix the note's file name when it has none, then sync its ID
    Rename {
        /// Note path (vault-relative or absolute)
        note: PathBuf,
    },

    /// Sync the frontmatter ID from the prefix already in the file name
    Sync {
        /// Note path (vault-relative or absolute)
        note: PathBuf,
    },

    /// Move the note's embedded assets to content-hash names
    Assets {
        /// Note path (vault-relative or absolute)
        note: PathBuf,

        /// Hash algorithm (overrides config)
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,

        /// What to do with assets whose canonical copy already exists
        #[arg(short, long)]
        duplicates: Option<DuplicatePolicy>,
    },

    /// Run a command by id
    Run {
        /// Command id, e.g. update-filename-by-zk
        command: ZkCommand,

        /// Note path (vault-relative or absolute)
        note: PathBuf,
    },

    /// Exit 0 if the command applies to the note, 1 otherwise
    Check {
        /// Command id
        command: ZkCommand,

        /// Note path (vault-relative or absolute)
        note: Option<PathBuf>,
    },

    /// List command ids
    Commands,

    /// Print the prefix of a file name, or a fresh one
    Prefix {
        /// File name to read the prefix from
        name: Option<String>,
    },

    /// Print the content hash of a file
    Hash {
        /// File to hash
        file: PathBuf,

        /// Hash algorithm (overrides config)
        #[arg(short, long)]
        algorithm: Option<HashAlgorithm>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_run_with_alias() {
        let cli = Cli::try_parse_from(["zk", "run", "update-assets-by-hash", "n.md"]).unwrap();
        match cli.command {
            Commands::Run { command, note } => {
                assert_eq!(command, ZkCommand::UpdateAssetsByHash);
                assert_eq!(note, PathBuf::from("n.md"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_rejects_unknown_command_id() {
        assert!(Cli::try_parse_from(["zk", "run", "nope", "n.md"]).is_err());
    }

    #[test]
    fn test_assets_overrides() {
        let cli = Cli::try_parse_from([
            "zk",
            "assets",
            "n.md",
            "--algorithm",
            "blake3",
            "--duplicates",
            "rewrite-link",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Assets {
                algorithm,
                duplicates,
                ..
            } => {
                assert_eq!(algorithm, Some(HashAlgorithm::Blake3));
                assert_eq!(duplicates, Some(DuplicatePolicy::RewriteLink));
            }
            _ => panic!("expected assets"),
        }
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
    }
}
