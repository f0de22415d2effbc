//! Upload Session Manager Library
//!
//! Tracks batches of files through their upload lifecycle, runs every
//! transfer concurrently through a pluggable transport, and keeps aggregate
//! statistics consistent with the tracked collection at all times.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
