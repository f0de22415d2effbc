//! Real-time progress display for upload sessions
//!
//! Renders one overall bar plus one bar per tracked file using indicatif,
//! refreshed from session snapshots on a fixed interval. When stderr is not a
//! terminal, a periodic one-line status is printed instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use upload_session::app::{SimulatedTransport, UploadSession};
//! use upload_session::cli::{ProgressConfig, ProgressDisplay};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Arc::new(UploadSession::new(SimulatedTransport::default()));
//!
//! let mut display = ProgressDisplay::new(ProgressConfig::default());
//! display.start(Arc::clone(&session))?;
//!
//! // ... submit files and wait ...
//!
//! display.finish().await;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::models::{FileId, FileStatus, TrackedFile};
use crate::app::session::{StatsReporter, UploadSession};
use crate::errors::{AppError, Result};

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// How often to refresh the display
    pub update_interval: Duration,
    /// How often to print a status line in text mode
    pub text_report_interval: Duration,
    /// Maximum width for file names in display
    pub max_filename_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            update_interval: Duration::from_millis(100),
            text_report_interval: Duration::from_secs(2),
            max_filename_width: 30,
        }
    }
}

/// Progress display manager
pub struct ProgressDisplay {
    config: ProgressConfig,
    update_task: Option<JoinHandle<()>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    is_terminal: bool,
}

impl ProgressDisplay {
    /// Create a new progress display with the given configuration
    pub fn new(config: ProgressConfig) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);

        Self {
            config,
            update_task: None,
            shutdown_tx: None,
            is_terminal,
        }
    }

    /// Check if bars will be drawn rather than text status lines
    pub fn uses_bars(&self) -> bool {
        self.config.enable_progress_bars && self.is_terminal
    }

    /// Start following a session
    ///
    /// # Errors
    ///
    /// Returns an error if a progress bar template is invalid
    pub fn start(&mut self, session: Arc<UploadSession>) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = if self.uses_bars() {
            let styles = BarStyles::new()?;
            self.spawn_bar_task(session, styles, shutdown_rx)
        } else {
            self.spawn_text_task(session, shutdown_rx)
        };

        self.shutdown_tx = Some(shutdown_tx);
        self.update_task = Some(task);
        debug!("Progress display started (bars: {})", self.uses_bars());
        Ok(())
    }

    /// Stop the display and wait for the final refresh
    pub async fn finish(&mut self) {
        debug!("Finishing progress display");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.update_task.take() {
            let _ = task.await;
        }
    }

    fn spawn_bar_task(
        &self,
        session: Arc<UploadSession>,
        styles: BarStyles,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let update_interval = self.config.update_interval;
        let width = self.config.max_filename_width;

        tokio::spawn(async move {
            let mut bars = SessionBars::new(styles, width);

            loop {
                bars.refresh(&session.files().await);

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        bars.refresh(&session.files().await);
                        bars.finish();
                        break;
                    }
                    _ = tokio::time::sleep(update_interval) => {}
                }
            }
        })
    }

    fn spawn_text_task(
        &self,
        session: Arc<UploadSession>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let report_interval = self.config.text_report_interval;

        tokio::spawn(async move {
            let mut last_report = Instant::now();

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(report_interval) => {
                        if last_report.elapsed() >= report_interval {
                            let stats = session.stats().await;
                            eprintln!("{}", StatsReporter::generate_compact_status(&stats));
                            last_report = Instant::now();
                        }
                    }
                }
            }
        })
    }
}

struct BarStyles {
    overall: ProgressStyle,
    file: ProgressStyle,
}

impl BarStyles {
    fn new() -> Result<Self> {
        let overall = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
            .progress_chars("##-");

        let file = ProgressStyle::default_bar()
            .template("  {prefix} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .map_err(|e| AppError::generic(format!("File progress template error: {}", e)))?
            .progress_chars("=>-");

        Ok(Self { overall, file })
    }
}

/// Bars for one session, kept in step with its snapshots
struct SessionBars {
    multi: MultiProgress,
    overall: ProgressBar,
    files: HashMap<FileId, ProgressBar>,
    styles: BarStyles,
    name_width: usize,
}

impl SessionBars {
    fn new(styles: BarStyles, name_width: usize) -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(styles.overall.clone());
        overall.set_message("Uploading");

        Self {
            multi,
            overall,
            files: HashMap::new(),
            styles,
            name_width,
        }
    }

    fn refresh(&mut self, snapshot: &[TrackedFile]) {
        let settled = snapshot.iter().filter(|f| f.status.is_terminal()).count();
        self.overall.set_length(snapshot.len() as u64);
        self.overall.set_position(settled as u64);

        // Drop bars for files that left the session
        self.files.retain(|id, bar| {
            let live = snapshot.iter().any(|f| &f.id == id);
            if !live {
                bar.finish_and_clear();
            }
            live
        });

        for file in snapshot {
            let bar = match self.files.get(&file.id) {
                Some(bar) => bar.clone(),
                None => {
                    let bar = self.multi.add(ProgressBar::new(100));
                    bar.set_style(self.styles.file.clone());
                    bar.set_prefix(truncate_name(&file.name, self.name_width));
                    self.files.insert(file.id.clone(), bar.clone());
                    bar
                }
            };

            bar.set_position(file.progress_percent.round() as u64);
            bar.set_message(status_message(file));
        }
    }

    fn finish(&self) {
        for bar in self.files.values() {
            bar.abandon();
        }
        self.overall.finish_with_message("Done");
    }
}

fn status_message(file: &TrackedFile) -> String {
    match file.status {
        FileStatus::Queued => "queued".to_string(),
        FileStatus::Uploading => "uploading".to_string(),
        FileStatus::Completed => "✅ completed".to_string(),
        FileStatus::Error => format!(
            "❌ {}",
            file.error_message.as_deref().unwrap_or("failed")
        ),
    }
}

/// Shorten a file name to at most `width` characters, padding short names
pub fn truncate_name(name: &str, width: usize) -> String {
    let count = name.chars().count();
    if count <= width {
        return format!("{:<width$}", name, width = width);
    }

    let keep = width.saturating_sub(3);
    let tail: String = name.chars().skip(count - keep).collect();
    format!("...{}", tail)
}
