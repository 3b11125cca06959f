//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Relay - buffers webhook events per source until they are polled
#[derive(Parser, Debug)]
#[command(
    name = "relay",
    author,
    version,
    about = "Per-source webhook relay with bounded mailboxes",
    long_about = "Accepts events on POST /wh/{source}, buffers up to N messages per source, \n\
                  and hands them out on GET /messages/{source}. Messages arriving at a \n\
                  full mailbox are dropped."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay server
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server listen address (":2110" binds all interfaces)
    #[arg(short, long, env = "RELAY_LISTEN")]
    pub listen: Option<String>,

    /// Max number of messages kept per source
    #[arg(short = 'n', long, env = "RELAY_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Throttle limit in requests per second per client
    #[arg(short = 'x', long, env = "RELAY_MAX_RPS")]
    pub max_rps: Option<u32>,

    /// Metrics server port (0 = disabled)
    #[arg(long, env = "RELAY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
