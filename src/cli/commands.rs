//! Command handlers for the upload session CLI
//!
//! This module implements the command handlers that connect CLI arguments to
//! the session and configuration APIs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::models::{FileId, RawFile};
use crate::app::session::{SessionConfig, StatsReporter, UploadSession};
use crate::app::transport::{SimulatedTransport, SimulatedTransportConfig};
use crate::cli::{ConfigAction, ConfigArgs, ProgressConfig, ProgressDisplay, UploadArgs};
use crate::config::AppConfig;
use crate::constants::cli::ROUND_TIMEOUT;
use crate::errors::{AppError, ConfigError, Result};

/// Handle the upload command
///
/// Reads the files, submits them as one batch, follows progress until every
/// upload has resolved, optionally retries failures, and prints a summary.
pub async fn handle_upload(args: UploadArgs, config: AppConfig, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let (session_config, transport_config) = build_runtime_config(&args, &config)?;
    info!(
        "Starting upload of {} files (failure rate {:.2})",
        args.files.len(),
        transport_config.failure_rate
    );

    let files = read_files(&args.files).await?;

    let session = Arc::new(UploadSession::with_config(
        SimulatedTransport::new(transport_config),
        session_config,
    ));

    let mut display = ProgressDisplay::new(ProgressConfig {
        enable_progress_bars: !args.no_progress,
        ..Default::default()
    });
    let show_progress = !quiet && !args.no_progress;
    if show_progress {
        display.start(Arc::clone(&session))?;
    }

    let report = session.submit_batch(files).await;
    for rejected in &report.rejected {
        eprintln!("⚠️  Skipped {}", rejected.reason);
    }

    if report.is_empty() {
        display.finish().await;
        return Err(AppError::generic("No files were accepted for upload"));
    }

    let mut cancelled = !wait_for_round(&session).await?;

    let mut round = 0;
    while !cancelled && round < args.retry_failed {
        let retryable: Vec<FileId> = session
            .files()
            .await
            .into_iter()
            .filter(|f| f.can_retry())
            .map(|f| f.id)
            .collect();

        if retryable.is_empty() {
            break;
        }

        round += 1;
        info!("Retry round {}: {} files", round, retryable.len());
        for id in &retryable {
            session.retry(id).await?;
        }

        cancelled = !wait_for_round(&session).await?;
    }

    display.finish().await;

    if cancelled {
        eprintln!("\n🛑 Upload cancelled");
        return Ok(());
    }

    let stats = session.stats().await;
    let files = session.files().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else if !quiet {
        println!("\n{}", StatsReporter::generate_summary_report(&stats));
        for file in files.iter().filter(|f| f.result.is_some()) {
            if let Some(result) = &file.result {
                println!("   {} -> {}", file.name, result.url);
            }
        }
    }

    if stats.failed_files > 0 {
        eprintln!("⚠️  {} files failed to upload:", stats.failed_files);
        for file in files.iter().filter(|f| f.error_message.is_some()) {
            eprintln!(
                "   {}: {}",
                file.name,
                file.error_message.as_deref().unwrap_or_default()
            );
        }
    }

    debug!("Upload command finished in {:?}", start_time.elapsed());
    Ok(())
}

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config_override: Option<PathBuf>) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let (path, created) = AppConfig::initialize_first_run(path).await?;
            if created {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let config = AppConfig::load(config_override).await?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::get_default_config_path()?.display());
        }
    }
    Ok(())
}

/// Merge configuration file values with command-line overrides
pub fn build_runtime_config(
    args: &UploadArgs,
    config: &AppConfig,
) -> Result<(SessionConfig, SimulatedTransportConfig)> {
    let (mut session_config, mut transport_config) = config.to_runtime_config();

    if let Some(max_size) = args.max_size {
        session_config.max_file_size = max_size;
    }
    if !args.allow.is_empty() {
        session_config.allowed_types = args.allow.clone();
    }
    if let Some(rate) = args.failure_rate {
        transport_config.failure_rate = rate;
    }

    session_config.validate().map_err(|reason| ConfigError::InvalidValue {
        field: "session".to_string(),
        reason,
    })?;
    transport_config
        .validate()
        .map_err(|reason| ConfigError::InvalidValue {
            field: "transport".to_string(),
            reason,
        })?;

    Ok((session_config, transport_config))
}

/// Read files from disk, skipping ones that cannot be read
async fn read_files(paths: &[PathBuf]) -> Result<Vec<RawFile>> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        match RawFile::from_path(path).await {
            Ok(file) => {
                debug!("Read {} ({} bytes, {})", file.name, file.size_bytes(), file.media_type);
                files.push(file);
            }
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                eprintln!("⚠️  Could not read {}: {}", path.display(), e);
            }
        }
    }

    if files.is_empty() {
        return Err(AppError::generic("None of the given files could be read"));
    }
    Ok(files)
}

/// Wait for every upload to resolve; returns `false` if cancelled by Ctrl-C
async fn wait_for_round(session: &UploadSession) -> Result<bool> {
    tokio::select! {
        idle = session.wait_for_idle(ROUND_TIMEOUT) => {
            if idle {
                Ok(true)
            } else {
                Err(AppError::generic(format!(
                    "Uploads did not finish within {:?}",
                    ROUND_TIMEOUT
                )))
            }
        }
        _ = tokio::signal::ctrl_c() => {
            let removed = session.clear().await;
            info!("Ctrl-C received, discarded {} files", removed);
            Ok(false)
        }
    }
}
