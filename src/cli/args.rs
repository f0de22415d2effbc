//! Command-line argument parsing for the upload session CLI
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Upload Session - track concurrent file uploads
#[derive(Parser, Debug)]
#[command(
    name = "upload_session",
    version,
    about = "Upload a batch of files concurrently and track their progress",
    long_about = "Submits files to an upload session backed by a simulated transport.
Every file uploads concurrently; failures are isolated per file and can be retried."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload files in one batch
    Upload(UploadArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the upload command
#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,

    /// Probability (0.0-1.0) that a simulated upload fails
    #[arg(long, value_name = "RATE")]
    pub failure_rate: Option<f64>,

    /// Accepted type: "*", a suffix like ".pdf", or a media type fragment like "image"
    #[arg(long = "allow", value_name = "TYPE")]
    pub allow: Vec<String>,

    /// Largest accepted file in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_size: Option<u64>,

    /// Retry failed files up to N rounds
    #[arg(long, value_name = "N", default_value = "0")]
    pub retry_failed: u32,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Print the final file list as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Where to write the file (defaults to the user config directory)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,

    /// Print the default configuration file location
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level requested by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl UploadArgs {
    /// Check argument values that clap cannot validate on its own
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.failure_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err("--failure-rate must be between 0.0 and 1.0".to_string());
            }
        }

        if self.max_size == Some(0) {
            return Err("--max-size must be greater than 0".to_string());
        }

        if self.allow.iter().any(|t| t.trim().is_empty()) {
            return Err("--allow must not be empty".to_string());
        }

        Ok(())
    }
}
