// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `scriptherd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptherd",
    version,
    about = "Supervise long-running scripts: start/stop/restart, live logs, history.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Scriptherd.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Scriptherd.toml")]
    pub config: String,

    /// Path of the SQLite log database.
    #[arg(long, value_name = "PATH", default_value = "logs.db")]
    pub db: String,

    /// Start every configured script at launch.
    #[arg(long)]
    pub autostart: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTHERD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the script table, but don't supervise anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
