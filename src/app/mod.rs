//! Core application logic for the upload session manager
//!
//! This module contains the data model, identity and preview generation,
//! submission validation, the transport seam and the session manager itself.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use upload_session::app::{RawFile, SimulatedTransport, UploadSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = UploadSession::new(SimulatedTransport::default());
//!
//! let file = RawFile::from_path("report.pdf".as_ref()).await?;
//! let report = session.submit_batch(vec![file]).await;
//!
//! for rejected in &report.rejected {
//!     eprintln!("Rejected {}: {}", rejected.name, rejected.reason);
//! }
//!
//! session.wait_for_idle(Duration::from_secs(60)).await;
//! for file in session.files().await {
//!     println!("{} -> {}", file.name, file.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod identity;
pub mod intake;
pub mod models;
pub mod session;
pub mod transport;

// Re-export main public API
pub use intake::{RejectedFile, validate_file};
pub use models::{
    FileCategory, FileId, FileStatus, RawFile, TrackedFile, UploadOutcome, UploadResult,
    format_file_size,
};
pub use session::{
    ProgressReporter, SessionConfig, SessionConfigBuilder, SessionConfigPresets, SessionEvent,
    SessionStats, StatsReporter, SubmissionReport, UploadSession,
};
pub use transport::{SimulatedTransport, SimulatedTransportConfig, Transport};
