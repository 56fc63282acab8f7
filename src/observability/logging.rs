//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Pick the log level from the environment or from settings
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - JSON format for production, pretty format for development

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Installs the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("app_runtime={}", config.log_level).into());

    let json = config.json.then(|| tracing_subscriber::fmt::layer().json());
    let pretty = (!config.json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
}
