//! Aggregate statistics for an upload session
//!
//! [`SessionStats`] is maintained incrementally by the session state, and
//! [`SessionStats::from_files`] recomputes it from scratch in one pass. The two
//! must always agree; the state checks this after every transition in debug
//! builds.

use serde::{Deserialize, Serialize};

use crate::app::models::{format_file_size, FileStatus, TrackedFile};

/// Aggregate counters over the live tracked-file collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Files currently registered
    pub total_files: u64,
    /// Registered files in `completed`
    pub completed_files: u64,
    /// Registered files in `error`
    pub failed_files: u64,
    /// Sum of sizes of registered files
    pub total_bytes: u64,
    /// Sum of sizes of completed files
    pub uploaded_bytes: u64,
}

impl SessionStats {
    /// Recompute statistics from a file collection in one pass
    pub fn from_files<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a TrackedFile>,
    {
        files.into_iter().fold(Self::default(), |mut stats, file| {
            stats.total_files += 1;
            stats.total_bytes += file.size_bytes;
            match file.status {
                FileStatus::Completed => {
                    stats.completed_files += 1;
                    stats.uploaded_bytes += file.size_bytes;
                }
                FileStatus::Error => stats.failed_files += 1,
                FileStatus::Queued | FileStatus::Uploading => {}
            }
            stats
        })
    }

    /// Files neither completed nor failed
    pub fn active_files(&self) -> u64 {
        self.total_files
            .saturating_sub(self.completed_files + self.failed_files)
    }

    /// Check the `completed + failed <= total` invariant
    pub fn is_consistent(&self) -> bool {
        self.completed_files + self.failed_files <= self.total_files
            && self.uploaded_bytes <= self.total_bytes
    }

    /// Completed files as a percentage of all registered files
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.completed_files as f64 / self.total_files as f64) * 100.0
        }
    }

    /// Check if every registered file has reached a terminal state
    pub fn is_settled(&self) -> bool {
        self.active_files() == 0
    }

    pub(crate) fn record_registered(&mut self, size_bytes: u64) {
        self.total_files += 1;
        self.total_bytes += size_bytes;
    }

    pub(crate) fn record_completed(&mut self, size_bytes: u64) {
        self.completed_files += 1;
        self.uploaded_bytes += size_bytes;
    }

    pub(crate) fn record_failed(&mut self) {
        self.failed_files += 1;
    }

    pub(crate) fn record_left_error(&mut self) {
        self.failed_files = self.failed_files.saturating_sub(1);
    }

    pub(crate) fn record_removed(&mut self, size_bytes: u64, status: FileStatus) {
        self.total_files = self.total_files.saturating_sub(1);
        self.total_bytes = self.total_bytes.saturating_sub(size_bytes);
        match status {
            FileStatus::Completed => {
                self.completed_files = self.completed_files.saturating_sub(1);
                self.uploaded_bytes = self.uploaded_bytes.saturating_sub(size_bytes);
            }
            FileStatus::Error => self.record_left_error(),
            FileStatus::Queued | FileStatus::Uploading => {}
        }
    }
}

/// Human-readable renderings of session statistics
pub struct StatsReporter;

impl StatsReporter {
    /// Generate a summary report
    pub fn generate_summary_report(stats: &SessionStats) -> String {
        format!(
            "Upload Session Summary:\n\
            ├─ Total Files: {}\n\
            ├─ Completed: {}\n\
            ├─ Failed: {}\n\
            ├─ Uploading: {}\n\
            ├─ Total Size: {}\n\
            ├─ Uploaded: {}\n\
            └─ Success Rate: {:.1}%",
            stats.total_files,
            stats.completed_files,
            stats.failed_files,
            stats.active_files(),
            format_file_size(stats.total_bytes),
            format_file_size(stats.uploaded_bytes),
            stats.success_rate()
        )
    }

    /// Generate a compact one-line status
    pub fn generate_compact_status(stats: &SessionStats) -> String {
        format!(
            "Session: {} total, {} completed, {} failed, {} uploading ({})",
            stats.total_files,
            stats.completed_files,
            stats.failed_files,
            stats.active_files(),
            format_file_size(stats.total_bytes)
        )
    }
}
