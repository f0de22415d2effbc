//! Configuration management for the upload session CLI
//!
//! This module provides TOML configuration with first-run initialization,
//! multi-location loading, and zero-config defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::session::{SessionConfig, SessionConfigBuilder};
use crate::app::transport::SimulatedTransportConfig;
use crate::constants::{config as locations, intake, preview, session, transport};
use crate::errors::{ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Session intake and preview settings
    pub session: SessionConfigToml,
    /// Simulated transport settings
    pub transport: TransportConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfigToml {
    /// Largest accepted file in bytes
    pub max_file_size: u64,
    /// Accepted types; empty accepts everything
    pub allowed_types: Vec<String>,
    /// Generate previews for image-like files
    pub previews_enabled: bool,
    /// Largest payload encoded into a preview
    pub max_preview_bytes: u64,
    /// Capacity of the observer event channel
    pub event_capacity: usize,
}

impl Default for SessionConfigToml {
    fn default() -> Self {
        Self {
            max_file_size: intake::DEFAULT_MAX_FILE_SIZE,
            allowed_types: Vec::new(),
            previews_enabled: true,
            max_preview_bytes: preview::DEFAULT_MAX_PREVIEW_BYTES,
            event_capacity: session::DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// TOML-friendly simulated transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfigToml {
    /// Shortest delay between progress ticks in milliseconds
    pub min_tick_interval_ms: u64,
    /// Longest delay between progress ticks in milliseconds
    pub max_tick_interval_ms: u64,
    /// Smallest progress increment per tick (percent)
    pub min_progress_step: f64,
    /// Largest progress increment per tick (percent)
    pub max_progress_step: f64,
    /// Probability (0.0-1.0) that an upload fails
    pub failure_rate: f64,
}

impl Default for TransportConfigToml {
    fn default() -> Self {
        Self {
            min_tick_interval_ms: transport::MIN_TICK_INTERVAL.as_millis() as u64,
            max_tick_interval_ms: transport::MAX_TICK_INTERVAL.as_millis() as u64,
            min_progress_step: transport::MIN_PROGRESS_STEP,
            max_progress_step: transport::MAX_PROGRESS_STEP,
            failure_rate: transport::DEFAULT_FAILURE_RATE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (SessionConfig, SimulatedTransportConfig) {
        (
            self.session.to_runtime_config(),
            self.transport.to_runtime_config(),
        )
    }

    /// Check every section for invalid values
    pub fn validate(&self) -> ConfigResult<()> {
        let (session, transport) = self.to_runtime_config();
        session
            .validate()
            .map_err(|reason| invalid_value("session", reason))?;
        transport
            .validate()
            .map_err(|reason| invalid_value("transport", reason))?;

        if !matches!(
            self.logging.level.as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(invalid_value(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }
        Ok(())
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the project-local file and
    /// then the user config file are tried, falling back to defaults.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file at `path` (or the user config location)
    /// if none exists. Returns the path and whether it was created.
    pub async fn initialize_first_run(path: Option<PathBuf>) -> Result<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content()).await?;

        info!("Created configuration file: {}", config_path.display());
        Ok((config_path, true))
    }

    /// Render this configuration as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(locations::LOCAL_CONFIG_FILE)];
        if let Ok(user_path) = Self::get_default_config_path() {
            search_paths.push(user_path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(locations::CONFIG_DIR_NAME)
            .join(locations::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with comments
    pub fn generate_default_config_content() -> String {
        let transport = TransportConfigToml::default();

        format!(
            r#"# Upload Session Configuration
# You can customize any of these settings to suit your needs.

[session]
# Largest accepted file in bytes (50 MiB)
max_file_size = {}

# Accepted types: "*", file suffixes like ".pdf", or media type
# fragments like "image". Empty accepts everything.
allowed_types = []

# Generate data-URL previews for images
previews_enabled = true
max_preview_bytes = {}

# Capacity of the session event channel
event_capacity = {}

[transport]
# Simulated transport timing
min_tick_interval_ms = {}
max_tick_interval_ms = {}
min_progress_step = {:.1}
max_progress_step = {:.1}

# Probability that an upload fails (0.0 - 1.0)
failure_rate = {}

[logging]
level = "warn"  # error, warn, info, debug, trace
colored_output = true
"#,
            intake::DEFAULT_MAX_FILE_SIZE,
            preview::DEFAULT_MAX_PREVIEW_BYTES,
            session::DEFAULT_EVENT_CAPACITY,
            transport.min_tick_interval_ms,
            transport.max_tick_interval_ms,
            transport.min_progress_step,
            transport.max_progress_step,
            transport.failure_rate,
        )
    }
}

fn invalid_value(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl SessionConfigToml {
    /// Convert to runtime SessionConfig
    pub fn to_runtime_config(&self) -> SessionConfig {
        SessionConfigBuilder::new()
            .max_file_size(self.max_file_size)
            .allowed_types(self.allowed_types.iter().cloned())
            .previews_enabled(self.previews_enabled)
            .max_preview_bytes(self.max_preview_bytes)
            .event_capacity(self.event_capacity)
            .build()
    }
}

impl TransportConfigToml {
    /// Convert to runtime SimulatedTransportConfig
    pub fn to_runtime_config(&self) -> SimulatedTransportConfig {
        SimulatedTransportConfig {
            min_tick_interval: Duration::from_millis(self.min_tick_interval_ms),
            max_tick_interval: Duration::from_millis(self.max_tick_interval_ms),
            min_progress_step: self.min_progress_step,
            max_progress_step: self.max_progress_step,
            failure_rate: self.failure_rate,
        }
    }
}
