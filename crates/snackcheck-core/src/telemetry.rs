//! Tracing initialisation for snackcheck binaries.
//!
//! Logs go to stderr so reports printed on stdout stay machine-readable.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// Initialise the global tracing subscriber from environment settings,
/// with `json` and `level` as overrides.
pub fn init_tracing(json: bool, level: Level) {
    init_logging(&LogConfig::from_env().with_json(json).with_level(level));
}

/// Initialise the global tracing subscriber. Only the first call in a
/// process takes effect.
pub fn init_logging(config: &LogConfig) {
    let env_filter = EnvFilter::try_new(config.directive())
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}
