//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Shadowguard -- flag SQL injection attempts in application logs.
///
/// Use `shadowguard <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "shadowguard", version, about, long_about = None)]
pub struct Cli {
    /// Path to the shadowguard.toml configuration file.
    #[arg(short, long, default_value = "shadowguard.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan log lines from a file or stdin.
    Scan(ScanArgs),

    /// List the compiled detection signatures.
    Signatures,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Scan a log file (or stdin) line by line.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Log file to scan, `-` for stdin.
    #[arg(default_value = "-")]
    pub path: PathBuf,

    /// Source IP attached to every plain-text line.
    #[arg(long)]
    pub ip: Option<String>,

    /// Treat input as JSON lines with `message`, `ip_address` and `timestamp` fields.
    #[arg(long)]
    pub json_lines: bool,
}

impl ScanArgs {
    /// Whether input comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

// ---- config ----

/// Manage shadowguard configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scan, detectors).
        #[arg(long)]
        section: Option<String>,
    },
}
