//! CLI argument definitions for fwscope.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Firewall log monitor.
///
/// Tails an iptables/ufw log file, parses each line into a structured
/// event, and drives the session state machine that the presentation
/// layer reads.
#[derive(Parser, Debug)]
#[command(name = "fwscope")]
#[command(version, about, long_about = None)]
pub struct AppCli {
    /// Path to fwscope.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the firewall log file (overrides the config file).
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Read the file from the beginning (include historical entries).
    #[arg(long)]
    pub history: bool,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting.
    #[arg(long)]
    pub validate: bool,
}
