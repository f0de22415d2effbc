//! Submission validation
//!
//! Files are checked against the session's size limit and allowed-types list
//! before they are registered. Rejections are per file and never fail a batch.

use serde::Serialize;

use crate::app::models::RawFile;
use crate::constants::intake::ANY_TYPE;
use crate::errors::IntakeError;

/// A file that was not accepted into the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    /// Name of the rejected file
    pub name: String,
    /// Why it was rejected
    pub reason: String,
}

impl RejectedFile {
    fn from_error(name: &str, error: &IntakeError) -> Self {
        Self {
            name: name.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Check whether a file matches an allowed-types list
///
/// An empty list accepts everything. `"*"` matches any file, an entry starting
/// with `.` matches a file-name suffix, and any other entry matches when the
/// media type contains it. All comparisons ignore case.
pub fn matches_allowed_types(file: &RawFile, allowed_types: &[String]) -> bool {
    if allowed_types.is_empty() {
        return true;
    }

    let name = file.name.to_lowercase();
    let media_type = file.media_type.to_lowercase();

    allowed_types.iter().any(|allowed| {
        let allowed = allowed.to_lowercase();
        if allowed == ANY_TYPE {
            true
        } else if allowed.starts_with('.') {
            name.ends_with(&allowed)
        } else {
            media_type.contains(&allowed)
        }
    })
}

/// Validate a single file against the size limit and allowed types
pub fn validate_file(
    file: &RawFile,
    max_file_size: u64,
    allowed_types: &[String],
) -> Result<(), IntakeError> {
    let size = file.size_bytes();
    if size > max_file_size {
        return Err(IntakeError::TooLarge {
            name: file.name.clone(),
            size,
            limit: max_file_size,
        });
    }

    if !matches_allowed_types(file, allowed_types) {
        return Err(IntakeError::UnsupportedType {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
        });
    }

    Ok(())
}

/// Split a batch into accepted files and rejections, preserving order
pub fn partition_batch(
    files: Vec<RawFile>,
    max_file_size: u64,
    allowed_types: &[String],
) -> (Vec<RawFile>, Vec<RejectedFile>) {
    let mut accepted = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();

    for file in files {
        match validate_file(&file, max_file_size, allowed_types) {
            Ok(()) => accepted.push(file),
            Err(e) => rejected.push(RejectedFile::from_error(&file.name, &e)),
        }
    }

    (accepted, rejected)
}
