//! Configuration for upload sessions
//!
//! Runtime configuration with a builder and a couple of presets, so limits
//! are never hard-coded at call sites.

use serde::{Deserialize, Serialize};

use crate::constants::{intake, preview, session};

/// Runtime configuration of an upload session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Largest accepted file in bytes
    pub max_file_size: u64,
    /// Accepted types (`"*"`, `.ext` suffixes or media type fragments); empty accepts all
    pub allowed_types: Vec<String>,
    /// Whether previews are generated for image-like files
    pub previews_enabled: bool,
    /// Largest payload encoded into a preview
    pub max_preview_bytes: u64,
    /// Capacity of the observer event channel
    pub event_capacity: usize,
}

impl SessionConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size == 0 {
            return Err("max_file_size must be greater than 0".to_string());
        }
        if self.previews_enabled && self.max_preview_bytes == 0 {
            return Err("max_preview_bytes must be greater than 0 when previews are enabled".to_string());
        }
        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than 0".to_string());
        }
        if self.allowed_types.iter().any(|t| t.trim().is_empty()) {
            return Err("allowed_types must not contain empty entries".to_string());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfigPresets::production()
    }
}

/// Builder for session configurations
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    max_file_size: Option<u64>,
    allowed_types: Option<Vec<String>>,
    previews_enabled: Option<bool>,
    max_preview_bytes: Option<u64>,
    event_capacity: Option<usize>,
}

impl SessionConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum accepted file size
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set the accepted types
    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable preview generation
    pub fn previews_enabled(mut self, enabled: bool) -> Self {
        self.previews_enabled = Some(enabled);
        self
    }

    /// Set the preview payload limit
    pub fn max_preview_bytes(mut self, bytes: u64) -> Self {
        self.max_preview_bytes = Some(bytes);
        self
    }

    /// Set the observer event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SessionConfig {
        SessionConfig {
            max_file_size: self.max_file_size.unwrap_or(intake::DEFAULT_MAX_FILE_SIZE),
            allowed_types: self.allowed_types.unwrap_or_default(),
            previews_enabled: self.previews_enabled.unwrap_or(true),
            max_preview_bytes: self
                .max_preview_bytes
                .unwrap_or(preview::DEFAULT_MAX_PREVIEW_BYTES),
            event_capacity: self.event_capacity.unwrap_or(session::DEFAULT_EVENT_CAPACITY),
        }
    }
}

/// Configuration presets for different use cases
pub struct SessionConfigPresets;

impl SessionConfigPresets {
    /// Configuration for normal use
    pub fn production() -> SessionConfig {
        SessionConfigBuilder::new().build()
    }

    /// Small limits for tests
    pub fn testing() -> SessionConfig {
        SessionConfigBuilder::new()
            .max_file_size(1024 * 1024)
            .max_preview_bytes(64 * 1024)
            .event_capacity(1024)
            .build()
    }
}
