//! Internal state of an upload session
//!
//! The tracked-file collection and its running counters live together so
//! every transition updates both in one step. Callers hold the session lock
//! for the duration of a single method call, which makes each transition
//! atomic with respect to every other.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::app::identity;
use crate::app::models::{FileId, FileStatus, RawFile, TrackedFile, UploadOutcome};
use crate::errors::{SessionError, SessionResult};

use super::stats::SessionStats;

/// Upload work to issue after a registration or retry
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Entry the upload belongs to
    pub id: FileId,
    /// Attempt number the upload is scoped to
    pub attempt: u32,
    /// Payload to transfer
    pub source: Arc<RawFile>,
}

/// How a transport resolution was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Entry moved to `completed`
    Completed { name: String },
    /// Entry moved to `error`
    Failed { name: String, message: String },
    /// Entry gone, no longer uploading, or on a newer attempt
    Stale,
}

/// Tracked files plus running aggregate counters
#[derive(Debug, Default)]
pub struct SessionState {
    /// All live entries by id
    files: HashMap<FileId, TrackedFile>,
    /// Display order: newest batch first, submission order within a batch
    order: Vec<FileId>,
    /// Incrementally maintained counters
    stats: SessionStats,
}

impl SessionState {
    /// Create empty session state
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id not currently present in the session
    pub fn allocate_id(&self) -> FileId {
        loop {
            let id = identity::new_id();
            if !self.files.contains_key(&id) {
                return id;
            }
        }
    }

    /// Register a batch of raw files and start their first attempt
    ///
    /// All entries become visible together. Returns one pending upload per
    /// registered file, in submission order.
    pub fn register_batch(&mut self, sources: Vec<Arc<RawFile>>) -> Vec<PendingUpload> {
        let mut batch_ids = Vec::with_capacity(sources.len());
        let mut pending = Vec::with_capacity(sources.len());

        for source in sources {
            let id = self.allocate_id();
            let mut file = TrackedFile::new(id.clone(), Arc::clone(&source));
            let attempt = file.begin_attempt();

            self.stats.record_registered(file.size_bytes);
            self.files.insert(id.clone(), file);
            batch_ids.push(id.clone());
            pending.push(PendingUpload { id, attempt, source });
        }

        batch_ids.append(&mut self.order);
        self.order = batch_ids;

        self.debug_check();
        debug!("Registered {} files", pending.len());
        pending
    }

    /// Apply a progress tick scoped to an attempt
    ///
    /// Returns `false` when the update was ignored.
    pub fn apply_progress(&mut self, id: &FileId, attempt: u32, percent: f64) -> bool {
        match self.files.get_mut(id) {
            Some(file) if file.attempt == attempt => file.apply_progress(percent),
            Some(_) => {
                debug!("Ignoring progress for {} from superseded attempt {}", id, attempt);
                false
            }
            None => {
                debug!("Ignoring progress for untracked file {}", id);
                false
            }
        }
    }

    /// Check whether `attempt` is the live upload of `id`
    pub fn is_current_attempt(&self, id: &FileId, attempt: u32) -> bool {
        self.files
            .get(id)
            .is_some_and(|file| file.attempt == attempt && file.is_uploading())
    }

    /// Apply a transport resolution scoped to an attempt
    pub fn resolve(&mut self, id: &FileId, attempt: u32, outcome: UploadOutcome) -> Resolution {
        let Some(file) = self.files.get_mut(id) else {
            debug!("Dropping result for untracked file {}", id);
            return Resolution::Stale;
        };

        if file.attempt != attempt || file.status != FileStatus::Uploading {
            debug!(
                "Dropping stale result for {} (attempt {}, status {})",
                id, attempt, file.status
            );
            return Resolution::Stale;
        }

        let resolution = match outcome {
            UploadOutcome::Success(result) => {
                file.mark_completed(result);
                self.stats.record_completed(file.size_bytes);
                Resolution::Completed {
                    name: file.name.clone(),
                }
            }
            UploadOutcome::Failure { message } => {
                file.mark_failed(message.clone());
                self.stats.record_failed();
                Resolution::Failed {
                    name: file.name.clone(),
                    message,
                }
            }
        };

        self.debug_check();
        resolution
    }

    /// Move a failed entry back to `uploading` for a new attempt
    pub fn begin_retry(&mut self, id: &FileId) -> SessionResult<PendingUpload> {
        let file = self
            .files
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound { id: id.clone() })?;

        if file.status != FileStatus::Error {
            return Err(SessionError::InvalidState {
                id: id.clone(),
                status: file.status,
                reason: "Only failed uploads can be retried".to_string(),
            });
        }

        let Some(source) = file.retained_source.clone() else {
            return Err(SessionError::InvalidState {
                id: id.clone(),
                status: file.status,
                reason: "Original file is no longer available".to_string(),
            });
        };

        let attempt = file.begin_attempt();
        self.stats.record_left_error();

        self.debug_check();
        Ok(PendingUpload {
            id: id.clone(),
            attempt,
            source,
        })
    }

    /// Remove an entry regardless of its status
    pub fn remove(&mut self, id: &FileId) -> SessionResult<TrackedFile> {
        let file = self
            .files
            .remove(id)
            .ok_or_else(|| SessionError::NotFound { id: id.clone() })?;

        self.order.retain(|existing| existing != id);
        self.stats.record_removed(file.size_bytes, file.status);

        self.debug_check();
        Ok(file)
    }

    /// Remove every entry and reset counters; returns how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.files.len();
        self.files.clear();
        self.order.clear();
        self.stats = SessionStats::default();
        removed
    }

    /// Attach a preview token to an entry if it still exists
    pub fn set_preview(&mut self, id: &FileId, token: String) -> bool {
        match self.files.get_mut(id) {
            Some(file) => {
                file.preview_token = Some(token);
                true
            }
            None => false,
        }
    }

    /// Get an entry by id
    pub fn get(&self, id: &FileId) -> Option<&TrackedFile> {
        self.files.get(id)
    }

    /// Detached copy of one entry, without its source payload
    pub fn snapshot_of(&self, id: &FileId) -> Option<TrackedFile> {
        self.files.get(id).map(TrackedFile::detached)
    }

    /// Check whether an id is tracked
    pub fn contains(&self, id: &FileId) -> bool {
        self.files.contains_key(id)
    }

    /// Snapshot of all entries in display order
    pub fn snapshot(&self) -> Vec<TrackedFile> {
        self.order
            .iter()
            .filter_map(|id| self.files.get(id))
            .map(TrackedFile::detached)
            .collect()
    }

    /// Number of tracked entries
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no entries are tracked
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Incrementally maintained statistics
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Statistics recomputed from the live collection
    pub fn recompute_stats(&self) -> SessionStats {
        SessionStats::from_files(self.files.values())
    }

    /// Check if any entry is uploading
    pub fn is_uploading(&self) -> bool {
        self.files.values().any(TrackedFile::is_uploading)
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.stats, self.recompute_stats(), "session counters drifted");
        debug_assert_eq!(self.order.len(), self.files.len());
    }
}
