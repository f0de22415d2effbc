//! Transport adapter seam
//!
//! The session depends only on the [`Transport`] contract: given a file,
//! perform the transfer, report progress through the supplied
//! [`ProgressReporter`], and resolve with an [`UploadOutcome`]. How the bytes
//! move (batching, chunking, internal retries) is up to the implementation.
//!
//! [`SimulatedTransport`] is a self-contained implementation used by the CLI
//! and for demonstrations.

pub mod simulated;

use futures::future::BoxFuture;

use crate::app::models::{RawFile, UploadOutcome};
use crate::app::session::ProgressReporter;

pub use simulated::{SimulatedTransport, SimulatedTransportConfig};

/// Contract consumed by the upload session
///
/// Implementations must resolve every call with an outcome; transport errors
/// are expressed as [`UploadOutcome::Failure`], never as panics.
///
/// # Examples
///
/// ```rust
/// use futures::future::BoxFuture;
/// use futures::FutureExt;
/// use upload_session::app::models::{RawFile, UploadOutcome};
/// use upload_session::app::session::ProgressReporter;
/// use upload_session::app::transport::Transport;
///
/// struct AlwaysFails;
///
/// impl Transport for AlwaysFails {
///     fn upload<'a>(
///         &'a self,
///         _file: &'a RawFile,
///         progress: ProgressReporter,
///     ) -> BoxFuture<'a, UploadOutcome> {
///         async move {
///             progress.report(50.0).await;
///             UploadOutcome::failure("offline")
///         }
///         .boxed()
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// Transfer one file, reporting progress as it goes
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        progress: ProgressReporter,
    ) -> BoxFuture<'a, UploadOutcome>;
}
