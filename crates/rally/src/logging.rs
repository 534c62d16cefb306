//! Logging setup for the Rally binary.
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to
//! everything except the WebSocket stack, which is held at `warn` so frame
//! level chatter does not drown out game events.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const QUIET_DEPENDENCIES: &[&str] = &["tungstenite=warn", "tokio_tungstenite=warn"];

fn default_directives(level: &str) -> String {
    std::iter::once(level)
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber.
///
/// `force_json` comes from `--json-logs` and overrides `logging.json_format`.
/// Fails if the level is not a valid filter or a subscriber already exists.
pub fn setup_logging(
    settings: &LoggingSettings,
    force_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(&settings.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    if force_json || settings.json_format {
        registry
            .with(fmt::layer()
                .json()
                .with_current_span(false)
                .with_target(true)
                .with_thread_ids(true)
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_thread_ids(true)
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", settings.level);
    Ok(())
}

/// Logs the startup banner.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║              🧭 RALLY SERVER             ║");
    info!("║                  v{:<8}               ║", version);
    info!("║                                          ║");
    info!("║  📍 Nearby teams within any radius       ║");
    info!("║  🚩 Posts unlocked on arrival            ║");
    info!("║  🧹 Positions expire after going quiet   ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_websocket_stack() {
        let directives = default_directives("debug");
        assert_eq!(directives, "debug,tungstenite=warn,tokio_tungstenite=warn");
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
