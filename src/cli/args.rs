/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// airq — query airport subscription status and keep the subscription registry in sync.
#[derive(Debug, Parser)]
#[command(
    name = "airq",
    about = "Query airport subscription status and keep the local subscription registry in sync",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Airport (identity) to query, as named under `airports` in the registry.
    #[arg(short, long, env = "AIRQ_AIRPORT", value_name = "NAME")]
    pub airport: String,

    /// Registry file holding airport credentials and tracked subscriptions.
    #[arg(
        short,
        long,
        env = "AIRQ_CONFIG",
        value_name = "PATH",
        default_value = "subscribes.json"
    )]
    pub config: PathBuf,

    /// Output format. Auto-detects: table when TTY, json when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Omit table headers (useful for awk/cut processing).
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Debug-level logging and per-phase timing on stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Human-readable lines and tables.
    Table,
    /// Pretty-printed JSON.
    Json,
    /// Compact single-line JSON.
    Compact,
}

/// View modes.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show plan, expiry, usage and subscribe URL, then sync the registry.
    #[command(alias = "info")]
    Summary(SummaryArgs),
    /// Show the server list as a table.
    Servers,
    /// Show the traffic log.
    Log,
}

/// Arguments for `airq summary`.
#[derive(Debug, Parser)]
pub struct SummaryArgs {
    /// Report URL changes without writing the registry.
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_alias() {
        let cli = Cli::try_parse_from(["airq", "--airport", "alpha", "info"]).unwrap();
        assert_eq!(cli.airport, "alpha");
        assert!(matches!(cli.command, Command::Summary(SummaryArgs { dry_run: false })));
        assert_eq!(cli.config, PathBuf::from("subscribes.json"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["airq", "--airport", "alpha", "traffic"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["airq", "-a", "alpha", "-c", "r.json", "servers", "--json"])
                .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Servers));
        assert_eq!(cli.config, PathBuf::from("r.json"));
    }
}
