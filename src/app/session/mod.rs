//! Upload session manager
//!
//! Tracks a set of files through `queued → uploading → completed | error`,
//! keeps aggregate statistics in step with the collection, and runs every
//! transport call concurrently.
//!
//! # Features
//!
//! - **Atomic transitions**: every state change happens under one lock
//! - **Partial-failure isolation**: one failed upload never affects another
//! - **Stale-update safety**: results for removed, cleared or superseded
//!   attempts are dropped
//! - **Retry**: failed files keep their payload and can be sent again
//! - **Events**: observers can subscribe to a broadcast of session events
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use upload_session::app::models::RawFile;
//! use upload_session::app::session::{SessionConfigBuilder, StatsReporter, UploadSession};
//! use upload_session::app::transport::SimulatedTransport;
//!
//! # async fn example() {
//! let config = SessionConfigBuilder::new()
//!     .allowed_types(["image", ".pdf"])
//!     .build();
//! let session = UploadSession::with_config(SimulatedTransport::default(), config);
//!
//! let report = session
//!     .submit_batch(vec![RawFile::new("cat.png", "image/png", vec![0x89, 0x50])])
//!     .await;
//!
//! session.wait_for_idle(Duration::from_secs(30)).await;
//!
//! for file in session.files().await {
//!     if file.can_retry() {
//!         session.retry(&file.id).await.ok();
//!     }
//! }
//!
//! println!("{}", StatsReporter::generate_summary_report(&session.stats().await));
//! # let _ = report;
//! # }
//! ```

pub mod config;
pub mod core;
pub mod events;
pub mod progress;
pub mod state;
pub mod stats;

#[cfg(test)]
mod tests;

pub use config::{SessionConfig, SessionConfigBuilder, SessionConfigPresets};
pub use self::core::{SubmissionReport, UploadSession};
pub use events::SessionEvent;
pub use progress::ProgressReporter;
pub use stats::{SessionStats, StatsReporter};
