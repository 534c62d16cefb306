//! # Rally Server - Main Entry Point
//!
//! Location game server. Teams report their GPS position, see which other
//! teams are close by, and unlock posts by standing next to them. This crate
//! handles CLI parsing, configuration loading, logging and the application
//! lifecycle; the game itself lives in `rally_core` and the transport in
//! `rally_server`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! rally
//!
//! # Specify custom configuration
//! rally --config production.toml
//!
//! # Override specific settings
//! rally --bind 0.0.0.0:8080 --log-level debug
//!
//! # JSON logging for production
//! rally --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `config.toml`).
//! If the file doesn't exist, a default configuration will be created.
//! Teams and posts are declared in the same file:
//!
//! ```toml
//! [[teams]]
//! identity = "team1"
//! display_name = "Team One"
//! credential = "secret"
//!
//! [[posts]]
//! id = "post1"
//! longitude = 12.48
//! latitude = 55.77
//! task_text = "2+5"
//! solution = "7"
//! ```
//!
//! ## Signal Handling
//!
//! The server shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM. A second
//! signal exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the server until shutdown.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, PostSettings, ServerSettings, TeamSettings};
