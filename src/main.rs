//! Upload Session CLI application
//!
//! Command-line interface for uploading a batch of files through an upload
//! session with per-file progress, isolated failures and retries.

use std::process;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use upload_session::cli::{Cli, Commands, handle_config, handle_upload};
use upload_session::config::{AppConfig, LoggingConfig};
use upload_session::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // A broken config file must not prevent `config init` from running
    let config = AppConfig::load(cli.global.config.clone()).await;
    init_logging(&cli, config.as_ref().ok().map(|c| &c.logging));

    info!("Upload Session v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Upload(args) => {
            info!("Executing upload command");
            handle_upload(args, config?, cli.global.quiet).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, cli.global.config).await
        }
    }
}

/// Initialize logging from CLI verbosity flags, falling back to the config file
fn init_logging(cli: &Cli, logging: Option<&LoggingConfig>) {
    let level = match cli.log_level() {
        Some(level) => level.to_string().to_lowercase(),
        None => logging
            .map(|l| l.level.clone())
            .unwrap_or_else(|| "warn".to_string()),
    };
    let colored = logging.map_or(true, |l| l.colored_output);

    let mut filter = EnvFilter::from_default_env();
    match format!("upload_session={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(colored)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
