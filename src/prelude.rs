//! Prelude module for the upload session library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use upload_session::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use upload_session::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = UploadSession::new(SimulatedTransport::default());
//!     let file = RawFile::new("hello.txt", "text/plain", b"hello".to_vec());
//!
//!     session.submit_batch(vec![file]).await;
//!     session.wait_for_idle(std::time::Duration::from_secs(10)).await;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result, SessionError, SessionResult};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Data types
    FileId,
    FileStatus,
    RawFile,
    TrackedFile,
    UploadOutcome,
    UploadResult,

    // Session
    SessionConfig,
    SessionConfigBuilder,
    SessionEvent,
    SessionStats,
    SubmissionReport,
    UploadSession,

    // Transport seam
    ProgressReporter,
    SimulatedTransport,
    SimulatedTransportConfig,
    Transport,
};

// Configuration
pub use crate::config::AppConfig;

// Standard library re-exports that are commonly needed
pub use std::sync::Arc;
