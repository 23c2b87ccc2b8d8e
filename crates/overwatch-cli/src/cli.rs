//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use overwatch_core::ResourceKind;

/// Overwatch - Detect drift between live access control and its desired state
#[derive(Parser, Debug)]
#[command(name = "overwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration and provider selection shared by most commands
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Manager configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "OVERWATCH_CONFIG")]
    pub config: PathBuf,

    /// Provider whose resources are compared
    #[arg(short, long, default_value = "GitHub")]
    pub provider: String,

    /// Resource kinds to load; defaults to the provider's kinds
    #[arg(short, long = "kind")]
    pub kinds: Vec<ResourceKind>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync the desired-state repository once
    Sync {
        /// Manager configuration file (TOML, YAML or JSON)
        #[arg(short, long, env = "OVERWATCH_CONFIG")]
        config: PathBuf,
    },

    /// List the desired state
    Resources {
        #[command(flatten)]
        target: Target,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Compare a live snapshot with the desired state
    ///
    /// Exits with status 2 when drift is found.
    ///
    /// Examples:
    ///   overwatch drift -c overwatch.toml --live ./snapshot
    ///   overwatch drift -c overwatch.toml -p GoogleCloudPlatform --live ./snapshot --json
    Drift {
        #[command(flatten)]
        target: Target,

        /// Directory holding the live snapshot
        #[arg(short, long)]
        live: PathBuf,

        /// Output as JSON for CI/CD integration
        #[arg(long)]
        json: bool,
    },

    /// Poll a live snapshot for drift and resync once the TTL passes
    Watch {
        #[command(flatten)]
        target: Target,

        /// Directory holding the live snapshot
        #[arg(short, long)]
        live: PathBuf,

        /// Time between polls, e.g. 30s, 5m
        #[arg(long, default_value = "1m", value_parser = parse_interval)]
        poll: Duration,

        /// Stop after this many polls
        #[arg(long)]
        iterations: Option<u64>,
    },
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    overwatch_core::parse_ttl(value).map_err(|e| e.to_string())
}
