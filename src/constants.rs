//! Application constants for the upload session manager
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Submission limits
pub mod intake {
    /// Default maximum size of a single submitted file (50 MiB)
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Wildcard entry in an allowed-types list
    pub const ANY_TYPE: &str = "*";
}

/// Preview generation
pub mod preview {
    /// Media type prefix that marks a file as image-like
    pub const IMAGE_PREFIX: &str = "image/";

    /// Default maximum payload size encoded into a preview (10 MiB)
    pub const DEFAULT_MAX_PREVIEW_BYTES: u64 = 10 * 1024 * 1024;
}

/// Identifier generation
pub mod identity {
    /// Number of random base36 characters appended to a file id
    pub const RANDOM_SUFFIX_LEN: usize = 9;

    /// Alphabet used for base36 encoding
    pub const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
}

/// Session behaviour
pub mod session {
    use super::Duration;

    /// Capacity of the observer event channel
    pub const DEFAULT_EVENT_CAPACITY: usize = 256;

    /// Poll interval used while waiting for a session to go idle
    pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Upper bound of the progress percentage
    pub const MAX_PERCENT: f64 = 100.0;
}

/// Simulated transport defaults
pub mod transport {
    use super::Duration;

    /// Shortest delay between two progress ticks
    pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(100);

    /// Longest delay between two progress ticks
    pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(300);

    /// Smallest progress increment per tick (percent)
    pub const MIN_PROGRESS_STEP: f64 = 5.0;

    /// Largest progress increment per tick (percent)
    pub const MAX_PROGRESS_STEP: f64 = 20.0;

    /// Default probability that a simulated upload fails
    pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

    /// Message reported by a failed simulated upload
    pub const NETWORK_FAILURE_MESSAGE: &str = "Upload failed - network error";

    /// URL scheme and host for simulated uploads
    pub const URL_BASE: &str = "memory://uploads";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "upload-session.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "upload-session";

    /// File name inside the user config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Command-line behaviour
pub mod cli {
    use super::Duration;

    /// Longest time the upload command waits for a round of uploads
    pub const ROUND_TIMEOUT: Duration = Duration::from_secs(30 * 60);
}

// Re-export commonly used constants at module level for convenience
pub use intake::DEFAULT_MAX_FILE_SIZE;
pub use session::DEFAULT_EVENT_CAPACITY;
pub use transport::DEFAULT_FAILURE_RATE;
