//! Identity and preview generation for submitted files
//!
//! Identifiers are a base36 millisecond timestamp followed by random base36
//! characters, which keeps them roughly time-ordered and makes collisions
//! within a session negligible. Previews are data URLs built only for
//! image-like payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

use crate::app::models::{FileId, RawFile};
use crate::constants::identity::{BASE36_ALPHABET, RANDOM_SUFFIX_LEN};
use crate::errors::{PreviewError, PreviewResult};

/// Generate a new file identifier
///
/// # Examples
///
/// ```rust
/// use upload_session::app::identity::new_id;
///
/// let a = new_id();
/// let b = new_id();
/// assert_ne!(a, b);
/// ```
pub fn new_id() -> FileId {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut id = to_base36(millis);
    id.reserve(RANDOM_SUFFIX_LEN);
    for _ in 0..RANDOM_SUFFIX_LEN {
        let idx = fastrand::usize(..BASE36_ALPHABET.len());
        id.push(BASE36_ALPHABET[idx] as char);
    }
    FileId::from(id)
}

/// Encode an integer in lowercase base36
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Build a preview token for a file
///
/// Returns `Ok(None)` for files that are not image-like. Image-like files
/// produce a `data:<media type>;base64,<payload>` URL, or an error when the
/// payload is empty or larger than `max_bytes`.
pub fn generate_preview(file: &RawFile, max_bytes: u64) -> PreviewResult<Option<String>> {
    if !file.is_image_like() {
        return Ok(None);
    }

    if file.data.is_empty() {
        return Err(PreviewError::EmptyPayload);
    }

    let size = file.size_bytes();
    if size > max_bytes {
        return Err(PreviewError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    Ok(Some(format!(
        "data:{};base64,{}",
        file.media_type,
        STANDARD.encode(&file.data)
    )))
}
