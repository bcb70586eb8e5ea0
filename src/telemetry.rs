//! Telemetry initialization: tracing subscriber with env-based filtering.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured log level is
/// applied to this crate only.
pub fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("preheat_keeper={}", config.log_level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
