//! Observer notifications emitted by an upload session

use serde::Serialize;

use crate::app::models::FileId;

/// Something observable happened in the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A batch was registered and its uploads started
    BatchRegistered { count: usize, total_bytes: u64 },
    /// A file finished uploading
    FileCompleted { id: FileId, name: String },
    /// A file failed to upload
    FileFailed {
        id: FileId,
        name: String,
        message: String,
    },
    /// A failed file was sent again
    RetryStarted { id: FileId, attempt: u32 },
    /// A file was removed from the session
    FileRemoved { id: FileId },
    /// All files were removed
    SessionCleared { removed: usize },
    /// Every transport call of a batch has resolved
    BatchFinished {
        submitted: usize,
        completed: usize,
        failed: usize,
        discarded: usize,
    },
}
