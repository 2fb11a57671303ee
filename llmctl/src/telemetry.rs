//! Tracing initialization (fmt subscriber with an env filter).
//!
//! The filter is taken from `RUST_LOG` when set, and otherwise from the configured
//! `log_level`, which accepts the same directive syntax:
//!
//! ```yaml
//! log_level: "llmctl=debug,tower_http=info"
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the filter used by the subscriber: `RUST_LOG` wins over the configured level.
pub fn env_filter(log_level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(log_level)?),
    }
}

/// Initialize tracing with console output.
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(log_level: &str) -> anyhow::Result<()> {
    let env_filter = env_filter(log_level)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
