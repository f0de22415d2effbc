//! Command-line interface components
//!
//! This module contains CLI-specific code for the upload session application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, UploadArgs};
pub use commands::{build_runtime_config, handle_config, handle_upload};
pub use progress::{ProgressConfig, ProgressDisplay};
