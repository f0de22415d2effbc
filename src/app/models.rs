//! Data models for the upload session manager
//!
//! This module defines the core data structures shared by the session, the
//! transport seam and the CLI: raw submitted files, tracked file records,
//! upload results and the tagged outcome of a transport call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{preview, session};
use crate::errors::TransportError;

/// Opaque identifier of a tracked file, stable for its lifetime in a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle status of a tracked file
///
/// `Queued → Uploading → Completed` or `Uploading → Error`; `Error → Uploading`
/// is the only re-entry, through an explicit retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Registered but no transport call issued yet
    Queued,
    /// Transport call in flight
    Uploading,
    /// Terminal success
    Completed,
    /// Terminal failure, recoverable by retry
    Error,
}

impl FileStatus {
    /// Check if this status is terminal (`Completed` or `Error`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error)
    }

    /// Lowercase name used in messages and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Queued => "queued",
            FileStatus::Uploading => "uploading",
            FileStatus::Completed => "completed",
            FileStatus::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw file payload handed to a session by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// File name as presented by the caller
    pub name: String,
    /// Media (MIME) type, e.g. `image/png`
    pub media_type: String,
    /// File contents
    pub data: Vec<u8>,
}

impl RawFile {
    /// Create a raw file from in-memory contents
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Read a raw file from disk, guessing its media type from the extension
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = guess_media_type(&name).to_string();
        Ok(Self {
            name,
            media_type,
            data,
        })
    }

    /// Size of the payload in bytes
    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Check if the file is image-like and therefore eligible for a preview
    pub fn is_image_like(&self) -> bool {
        self.media_type
            .to_ascii_lowercase()
            .starts_with(preview::IMAGE_PREFIX)
    }
}

/// Guess a media type from a file name extension
pub fn guess_media_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "doc" | "docx" => "application/msword",
        "xls" | "xlsx" => "application/vnd.ms-excel",
        "ppt" | "pptx" => "application/vnd.ms-powerpoint",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "js" => "text/javascript",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Broad category of a file, derived from its media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Code,
    Other,
}

impl FileCategory {
    /// Classify a media type; the first matching rule wins
    pub fn from_media_type(media_type: &str) -> Self {
        let t = media_type.to_ascii_lowercase();

        if t.contains("image") {
            Self::Image
        } else if t.contains("video") {
            Self::Video
        } else if t.contains("audio") {
            Self::Audio
        } else if t.contains("pdf") || t.contains("document") || t.contains("word") {
            Self::Document
        } else if t.contains("spreadsheet") || t.contains("excel") {
            Self::Spreadsheet
        } else if t.contains("presentation") || t.contains("powerpoint") {
            Self::Presentation
        } else if t.contains("zip") || t.contains("rar") || t.contains("archive") {
            Self::Archive
        } else if t.contains("code") || t.contains("javascript") || t.contains("python") {
            Self::Code
        } else {
            Self::Other
        }
    }
}

/// Record returned by the transport for a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Server-assigned identity
    pub server_id: String,
    /// Canonical URL of the uploaded file
    pub url: String,
    /// When the upload completed
    pub uploaded_at: DateTime<Utc>,
    /// Optional preview URL derived by the server
    pub preview_url: Option<String>,
}

/// Tagged outcome of a single transport call
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Transfer succeeded
    Success(UploadResult),
    /// Transfer failed with a human-readable message
    Failure { message: String },
}

impl UploadOutcome {
    /// Build a failure outcome
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Check if this outcome is a success
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }
}

impl From<Result<UploadResult, TransportError>> for UploadOutcome {
    fn from(result: Result<UploadResult, TransportError>) -> Self {
        match result {
            Ok(upload) => UploadOutcome::Success(upload),
            Err(e) => UploadOutcome::failure(e.to_string()),
        }
    }
}

/// One file's lifecycle record within a session
///
/// Values handed out by the session are snapshots; mutating them has no
/// effect on the session. Snapshots never carry the source payload, so the
/// session stays its only owner.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedFile {
    /// Identifier assigned at submission
    pub id: FileId,
    /// File name captured at submission
    pub name: String,
    /// Size in bytes captured at submission
    pub size_bytes: u64,
    /// Media type captured at submission
    pub media_type: String,
    /// Current lifecycle status
    pub status: FileStatus,
    /// Progress in percent (0-100), meaningful while uploading
    pub progress_percent: f64,
    /// Encoded preview for image-like files
    pub preview_token: Option<String>,
    /// Present only when completed
    pub result: Option<UploadResult>,
    /// Present only when in error
    pub error_message: Option<String>,
    /// Number of transport calls issued for this entry
    pub attempt: u32,
    /// When the file was submitted
    pub submitted_at: DateTime<Utc>,
    /// Whether the original payload is still held by the session
    pub source_retained: bool,
    /// Original payload, kept for retry until completion
    #[serde(skip)]
    pub(crate) retained_source: Option<Arc<RawFile>>,
}

impl TrackedFile {
    /// Create a queued record that retains its source payload
    pub fn new(id: FileId, source: Arc<RawFile>) -> Self {
        Self {
            id,
            name: source.name.clone(),
            size_bytes: source.size_bytes(),
            media_type: source.media_type.clone(),
            status: FileStatus::Queued,
            progress_percent: 0.0,
            preview_token: None,
            result: None,
            error_message: None,
            attempt: 0,
            submitted_at: Utc::now(),
            source_retained: true,
            retained_source: Some(source),
        }
    }

    /// Copy of this record without the source payload
    pub(crate) fn detached(&self) -> Self {
        Self {
            retained_source: None,
            ..self.clone()
        }
    }

    /// Check if the original payload is still held
    pub fn has_retained_source(&self) -> bool {
        self.source_retained
    }

    /// Check if this entry can be retried right now
    pub fn can_retry(&self) -> bool {
        self.status == FileStatus::Error && self.source_retained
    }

    /// Check if this record is in progress
    pub fn is_uploading(&self) -> bool {
        self.status == FileStatus::Uploading
    }

    /// Broad category of this file
    pub fn category(&self) -> FileCategory {
        FileCategory::from_media_type(&self.media_type)
    }

    /// Begin a new attempt and return its number
    pub(crate) fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.status = FileStatus::Uploading;
        self.progress_percent = 0.0;
        self.error_message = None;
        self.result = None;
        self.attempt
    }

    /// Apply a progress tick; returns whether it changed anything
    pub(crate) fn apply_progress(&mut self, percent: f64) -> bool {
        if self.status != FileStatus::Uploading {
            return false;
        }
        let clamped = clamp_percent(percent);
        // Non-decreasing while uploading
        if clamped <= self.progress_percent {
            return false;
        }
        self.progress_percent = clamped;
        true
    }

    /// Mark completed and release the source payload
    pub(crate) fn mark_completed(&mut self, result: UploadResult) {
        self.status = FileStatus::Completed;
        self.progress_percent = session::MAX_PERCENT;
        self.result = Some(result);
        self.error_message = None;
        self.source_retained = false;
        self.retained_source = None;
    }

    /// Mark failed, keeping the source payload for retry
    pub(crate) fn mark_failed(&mut self, message: String) {
        self.status = FileStatus::Error;
        self.error_message = Some(message);
        self.result = None;
    }
}

/// Clamp a reported percentage to `[0, 100]`, mapping NaN to 0
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, session::MAX_PERCENT)
    }
}

/// Format a byte count for display (`"0 Bytes"`, `"1.5 KB"`, ...)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
