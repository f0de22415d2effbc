//! Simulated transport
//!
//! Advances progress in random steps on a random tick interval and, once it
//! reaches 100%, fails with a configurable probability. No bytes leave the
//! process; successful uploads receive an in-memory URL. A transfer whose
//! progress reporter has gone dead stops early as interrupted.

use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::identity;
use crate::app::models::{RawFile, UploadOutcome, UploadResult};
use crate::app::session::ProgressReporter;
use crate::constants::transport as defaults;
use crate::errors::TransportError;

use super::Transport;

/// Configuration for the simulated transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTransportConfig {
    /// Shortest delay between progress ticks
    pub min_tick_interval: Duration,
    /// Longest delay between progress ticks
    pub max_tick_interval: Duration,
    /// Smallest progress increment per tick (percent)
    pub min_progress_step: f64,
    /// Largest progress increment per tick (percent)
    pub max_progress_step: f64,
    /// Probability (0.0-1.0) that an upload fails at the end
    pub failure_rate: f64,
}

impl Default for SimulatedTransportConfig {
    fn default() -> Self {
        Self {
            min_tick_interval: defaults::MIN_TICK_INTERVAL,
            max_tick_interval: defaults::MAX_TICK_INTERVAL,
            min_progress_step: defaults::MIN_PROGRESS_STEP,
            max_progress_step: defaults::MAX_PROGRESS_STEP,
            failure_rate: defaults::DEFAULT_FAILURE_RATE,
        }
    }
}

impl SimulatedTransportConfig {
    /// Configuration with no delays, for tests
    pub fn instant() -> Self {
        Self {
            min_tick_interval: Duration::ZERO,
            max_tick_interval: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the failure probability
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err("failure_rate must be between 0.0 and 1.0".to_string());
        }
        if self.min_tick_interval > self.max_tick_interval {
            return Err("min_tick_interval must not exceed max_tick_interval".to_string());
        }
        if self.min_progress_step <= 0.0 {
            return Err("min_progress_step must be greater than 0".to_string());
        }
        if self.min_progress_step > self.max_progress_step {
            return Err("min_progress_step must not exceed max_progress_step".to_string());
        }
        Ok(())
    }

    fn next_tick(&self) -> Duration {
        if self.min_tick_interval == self.max_tick_interval {
            return self.min_tick_interval;
        }
        rand::thread_rng().gen_range(self.min_tick_interval..=self.max_tick_interval)
    }

    fn next_step(&self) -> f64 {
        if self.min_progress_step >= self.max_progress_step {
            return self.min_progress_step;
        }
        rand::thread_rng().gen_range(self.min_progress_step..self.max_progress_step)
    }
}

/// Transport that fakes a transfer with timed progress ticks
#[derive(Debug, Clone, Default)]
pub struct SimulatedTransport {
    config: SimulatedTransportConfig,
}

impl SimulatedTransport {
    /// Create a simulated transport
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: SimulatedTransportConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("Invalid simulated transport configuration: {}", e);
        }
        Self { config }
    }

    /// Get transport configuration
    pub fn config(&self) -> &SimulatedTransportConfig {
        &self.config
    }

    async fn run(&self, file: &RawFile, progress: ProgressReporter) -> UploadOutcome {
        self.transfer(file, progress).await.into()
    }

    async fn transfer(
        &self,
        file: &RawFile,
        progress: ProgressReporter,
    ) -> Result<UploadResult, TransportError> {
        let mut percent = 0.0;

        loop {
            tokio::time::sleep(self.config.next_tick()).await;
            percent = f64::min(percent + self.config.next_step(), 100.0);
            progress.report(percent).await;

            // Nobody is listening for this attempt any more
            if !progress.is_live().await {
                debug!("Stopping simulated upload of {} at {:.0}%", file.name, percent);
                return Err(TransportError::Interrupted);
            }
            if percent >= 100.0 {
                break;
            }
        }

        if fastrand::f64() < self.config.failure_rate {
            debug!("Simulated failure for {}", file.name);
            return Err(TransportError::Failed {
                message: defaults::NETWORK_FAILURE_MESSAGE.to_string(),
            });
        }

        let server_id = format!(
            "file_{}_{}",
            Utc::now().timestamp_millis(),
            identity::new_id().as_str().chars().rev().take(9).collect::<String>()
        );
        let url = format!("{}/{}/{}", defaults::URL_BASE, server_id, file.name);
        let preview_url = file.is_image_like().then(|| url.clone());

        Ok(UploadResult {
            server_id,
            url,
            uploaded_at: Utc::now(),
            preview_url,
        })
    }
}

impl Transport for SimulatedTransport {
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        progress: ProgressReporter,
    ) -> BoxFuture<'a, UploadOutcome> {
        self.run(file, progress).boxed()
    }
}
