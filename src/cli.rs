//! CLI definitions for capturekit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// capturekit CLI.
#[derive(Parser)]
#[command(name = "capturekit")]
#[command(about = "Capture page elements and debugger context from Chrome and submit them as coding tasks")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.capturekit/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Connect to Chrome and read commands from stdin (default)
    Run {
        /// Remote-debugging endpoint, overrides the config file
        #[arg(long, env = "CAPTUREKIT_ENDPOINT")]
        endpoint: Option<String>,
    },

    /// Store the task API key
    SetApiKey {
        /// API key
        key: String,
    },

    /// List available sources
    Sources,

    /// List recent sessions
    History,

    /// Show the effective configuration and validate it
    Config,
}
