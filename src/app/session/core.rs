//! Core upload session implementation
//!
//! [`UploadSession`] owns the tracked-file collection and is its only mutation
//! path. Every transport call runs as its own task; results and progress are
//! applied under the session lock, scoped to the attempt that produced them.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::identity;
use crate::app::intake::{self, RejectedFile};
use crate::app::models::{FileId, RawFile, TrackedFile, UploadOutcome};
use crate::app::transport::Transport;
use crate::constants::session::IDLE_POLL_INTERVAL;
use crate::errors::SessionResult;

use super::config::{SessionConfig, SessionConfigPresets};
use super::events::SessionEvent;
use super::progress::ProgressReporter;
use super::state::{PendingUpload, Resolution, SessionState};
use super::stats::SessionStats;

/// Outcome of a batch submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    /// Ids of registered files, in submission order
    pub accepted: Vec<FileId>,
    /// Files that failed intake validation
    pub rejected: Vec<RejectedFile>,
}

impl SubmissionReport {
    /// Check if nothing was registered
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// In-memory upload session
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use upload_session::app::models::RawFile;
/// use upload_session::app::session::UploadSession;
/// use upload_session::app::transport::{SimulatedTransport, SimulatedTransportConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = SimulatedTransport::new(SimulatedTransportConfig::instant().with_failure_rate(0.0));
/// let session = UploadSession::new(transport);
///
/// let report = session
///     .submit_batch(vec![RawFile::new("notes.txt", "text/plain", b"hello".to_vec())])
///     .await;
/// assert_eq!(report.accepted.len(), 1);
///
/// assert!(session.wait_for_idle(Duration::from_secs(5)).await);
/// assert_eq!(session.stats().await.completed_files, 1);
/// # }
/// ```
pub struct UploadSession {
    /// Intake and preview limits
    config: SessionConfig,
    /// Adapter performing the transfers
    transport: Arc<dyn Transport>,
    /// Shared state protected by async mutex
    state: Arc<Mutex<SessionState>>,
    /// Observer notifications
    events: broadcast::Sender<SessionEvent>,
}

impl UploadSession {
    /// Create a session with the production configuration
    pub fn new<T: Transport>(transport: T) -> Self {
        Self::with_config(transport, SessionConfigPresets::production())
    }

    /// Create a session with a custom configuration
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_config<T: Transport>(transport: T, config: SessionConfig) -> Self {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    /// Create a session around an already shared transport
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_shared_transport(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid session configuration: {}", e);
        }

        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            config,
            transport,
            state: Arc::new(Mutex::new(SessionState::new())),
            events,
        }
    }

    /// Get session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Validate, register and start uploading a batch of files
    ///
    /// Every accepted file is visible as `uploading` with 0% progress by the
    /// time this returns. Rejected files are reported and otherwise ignored.
    pub async fn submit_batch(&self, files: Vec<RawFile>) -> SubmissionReport {
        let (accepted, rejected) =
            intake::partition_batch(files, self.config.max_file_size, &self.config.allowed_types);

        for rejection in &rejected {
            warn!("Rejected {}: {}", rejection.name, rejection.reason);
        }

        if accepted.is_empty() {
            debug!("No files accepted, nothing to upload");
            return SubmissionReport {
                accepted: Vec::new(),
                rejected,
            };
        }

        let sources: Vec<Arc<RawFile>> = accepted.into_iter().map(Arc::new).collect();
        let total_bytes: u64 = sources.iter().map(|s| s.size_bytes()).sum();

        let pending = self.state.lock().await.register_batch(sources);
        let count = pending.len();

        info!("Registered batch of {} files ({} bytes)", count, total_bytes);
        self.emit(SessionEvent::BatchRegistered { count, total_bytes });

        let accepted: Vec<FileId> = pending.iter().map(|p| p.id.clone()).collect();

        if self.config.previews_enabled {
            for upload in &pending {
                if upload.source.is_image_like() {
                    self.spawn_preview(upload.id.clone(), Arc::clone(&upload.source));
                }
            }
        }

        let handles: Vec<JoinHandle<Resolution>> =
            pending.into_iter().map(|p| self.spawn_upload(p)).collect();
        self.spawn_batch_supervisor(handles);

        SubmissionReport { accepted, rejected }
    }

    /// Send a failed file again
    ///
    /// Fails with `InvalidState` unless the entry is in `error` and still
    /// holds its source, or `NotFound` for unknown ids.
    pub async fn retry(&self, id: &FileId) -> SessionResult<()> {
        let pending = self.state.lock().await.begin_retry(id)?;

        info!("Retrying {} (attempt {})", id, pending.attempt);
        self.emit(SessionEvent::RetryStarted {
            id: id.clone(),
            attempt: pending.attempt,
        });

        self.spawn_upload(pending);
        Ok(())
    }

    /// Remove a file regardless of its status
    pub async fn remove(&self, id: &FileId) -> SessionResult<()> {
        let removed = self.state.lock().await.remove(id)?;

        info!("Removed {} ({}, was {})", id, removed.name, removed.status);
        self.emit(SessionEvent::FileRemoved { id: id.clone() });
        Ok(())
    }

    /// Remove every file and reset all counters
    ///
    /// In-flight uploads keep running, but their results are discarded.
    pub async fn clear(&self) -> usize {
        let removed = self.state.lock().await.clear();

        info!("Cleared session ({} files removed)", removed);
        self.emit(SessionEvent::SessionCleared { removed });
        removed
    }

    /// Snapshot of all files, newest batch first
    pub async fn files(&self) -> Vec<TrackedFile> {
        self.state.lock().await.snapshot()
    }

    /// Snapshot of a single file
    pub async fn get(&self, id: &FileId) -> Option<TrackedFile> {
        self.state.lock().await.snapshot_of(id)
    }

    /// Incrementally maintained statistics
    pub async fn stats(&self) -> SessionStats {
        self.state.lock().await.stats()
    }

    /// Statistics recomputed from the live collection
    pub async fn recompute_stats(&self) -> SessionStats {
        self.state.lock().await.recompute_stats()
    }

    /// Check if any file is uploading
    pub async fn is_uploading(&self) -> bool {
        self.state.lock().await.is_uploading()
    }

    /// Wait until no file is uploading
    ///
    /// Returns `false` if the timeout elapsed first.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let idle = async {
            while self.is_uploading().await {
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, idle).await.is_ok()
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn spawn_upload(&self, pending: PendingUpload) -> JoinHandle<Resolution> {
        let state = Arc::clone(&self.state);
        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();

        tokio::spawn(async move {
            let PendingUpload {
                id,
                attempt,
                source,
            } = pending;
            let reporter = ProgressReporter::for_attempt(Arc::clone(&state), id.clone(), attempt);

            let outcome = AssertUnwindSafe(transport.upload(&source, reporter))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| UploadOutcome::failure("Transport panicked"));

            let resolution = state.lock().await.resolve(&id, attempt, outcome);

            match &resolution {
                Resolution::Completed { name } => {
                    info!("Uploaded {} ({})", name, id);
                    let _ = events.send(SessionEvent::FileCompleted {
                        id: id.clone(),
                        name: name.clone(),
                    });
                }
                Resolution::Failed { name, message } => {
                    warn!("Upload of {} ({}) failed: {}", name, id, message);
                    let _ = events.send(SessionEvent::FileFailed {
                        id: id.clone(),
                        name: name.clone(),
                        message: message.clone(),
                    });
                }
                Resolution::Stale => {
                    debug!("Discarded result for {} (attempt {})", id, attempt);
                }
            }

            resolution
        })
    }

    fn spawn_preview(&self, id: FileId, source: Arc<RawFile>) {
        let state = Arc::clone(&self.state);
        let max_bytes = self.config.max_preview_bytes;

        tokio::spawn(async move {
            match identity::generate_preview(&source, max_bytes) {
                Ok(Some(token)) => {
                    if !state.lock().await.set_preview(&id, token) {
                        debug!("Preview for {} ready after it was removed", id);
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("Preview for {} skipped: {}", id, e),
            }
        });
    }

    fn spawn_batch_supervisor(&self, handles: Vec<JoinHandle<Resolution>>) {
        let events = self.events.clone();
        let submitted = handles.len();

        tokio::spawn(async move {
            let (mut completed, mut failed, mut discarded) = (0, 0, 0);

            for joined in join_all(handles).await {
                match joined {
                    Ok(Resolution::Completed { .. }) => completed += 1,
                    Ok(Resolution::Failed { .. }) => failed += 1,
                    Ok(Resolution::Stale) => discarded += 1,
                    Err(e) => {
                        warn!("Upload task ended abnormally: {}", e);
                        discarded += 1;
                    }
                }
            }

            debug!(
                "Batch finished: {} submitted, {} completed, {} failed, {} discarded",
                submitted, completed, failed, discarded
            );
            let _ = events.send(SessionEvent::BatchFinished {
                submitted,
                completed,
                failed,
                discarded,
            });
        });
    }
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
