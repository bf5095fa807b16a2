use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snackcheck_client::{HttpClientFactory, HttpConfig, TokenIssuer};
use snackcheck_store::{LocalEventStore, RecordOrder, DEFAULT_STORE_DIR};
use tracing::Level;

use crate::poll::{PollConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS};
use crate::scenario::{TestSession, DEFAULT_CORRELATION_FIELD};

/// Directory holding the application's command sources.
pub const DEFAULT_COMMANDS_DIR: &str = "src/commands";

/// Filter directive variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "SNACKCHECK_LOG";

/// Set to `1` or `true` for JSON log lines.
pub const LOG_JSON_ENV: &str = "SNACKCHECK_LOG_JSON";

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Newline-delimited JSON instead of text
    pub json: bool,
    /// Verbosity when no filter directive is set
    pub level: String,
    /// Directive from `SNACKCHECK_LOG`, else `RUST_LOG`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            json: std::env::var(LOG_JSON_ENV)
                .map(|v| matches!(v.trim(), "1" | "true"))
                .unwrap_or(false),
            level: "info".to_string(),
            filter: std::env::var(LOG_ENV)
                .or_else(|_| std::env::var("RUST_LOG"))
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl LogConfig {
    /// Create a new log config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Plain text at `level`, ignoring the environment
    pub fn new(level: Level) -> Self {
        LogConfig {
            json: false,
            level: level.as_str().to_ascii_lowercase(),
            filter: None,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level.as_str().to_ascii_lowercase();
        self
    }

    pub fn with_filter(mut self, directive: &str) -> Self {
        self.filter = Some(directive.to_string());
        self
    }

    /// The filter directive in effect.
    pub fn directive(&self) -> &str {
        self.filter.as_deref().unwrap_or(&self.level)
    }
}

/// Suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Directory with `kebab-name.ts` sources and `kebab-name.toml` declarations
    pub commands_dir: PathBuf,
    /// Local provider datastore directory
    pub store_dir: PathBuf,
    /// GraphQL endpoint settings
    pub http: HttpConfig,
    /// Eventual-consistency polling
    pub poll: PollConfig,
    /// Input field carrying the correlation id
    pub correlation_field: String,
    /// Return datastore records newest first
    pub newest_first: bool,
    /// Tracing output
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig {
            commands_dir: std::env::var("SNACKCHECK_COMMANDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_COMMANDS_DIR)),
            store_dir: std::env::var("SNACKCHECK_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_DIR)),
            http: HttpConfig::from_env(),
            poll: PollConfig::new(
                env_millis("SNACKCHECK_POLL_INTERVAL_MS").unwrap_or(DEFAULT_POLL_INTERVAL_MS),
                env_millis("SNACKCHECK_POLL_TIMEOUT_MS").unwrap_or(DEFAULT_POLL_TIMEOUT_MS),
            ),
            correlation_field: std::env::var("SNACKCHECK_CORRELATION_FIELD")
                .unwrap_or_else(|_| DEFAULT_CORRELATION_FIELD.to_string()),
            newest_first: false,
            log: LogConfig::from_env(),
        }
    }
}

fn env_millis(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl SuiteConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a project checkout: `src/commands` and `.booster` under `root`
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        SuiteConfig {
            commands_dir: root.join(DEFAULT_COMMANDS_DIR),
            store_dir: root.join(DEFAULT_STORE_DIR),
            http: HttpConfig::new(snackcheck_client::DEFAULT_GRAPHQL_URL),
            poll: PollConfig::default(),
            correlation_field: DEFAULT_CORRELATION_FIELD.to_string(),
            newest_first: false,
            log: LogConfig::new(Level::INFO),
        }
    }

    pub fn with_commands_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.commands_dir = dir.into();
        self
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_graphql_url(mut self, url: &str) -> Self {
        self.http.graphql_url = url.to_string();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_correlation_field(mut self, field: &str) -> Self {
        self.correlation_field = field.to_string();
        self
    }

    pub fn with_newest_first(mut self, newest_first: bool) -> Self {
        self.newest_first = newest_first;
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Event store over `store_dir`.
    pub fn event_store(&self) -> LocalEventStore {
        let order = if self.newest_first {
            RecordOrder::Reversed
        } else {
            RecordOrder::AsWritten
        };
        LocalEventStore::new(&self.store_dir).with_order(order)
    }

    /// Session talking to the configured endpoint and datastore.
    pub fn session(&self, tokens: Arc<dyn TokenIssuer>) -> TestSession {
        TestSession::new(
            Arc::new(HttpClientFactory::new(self.http.clone())),
            tokens,
            Arc::new(self.event_store()),
        )
        .with_poll_config(self.poll)
        .with_correlation_field(&self.correlation_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snackcheck_client::fakes::FakeTokenIssuer;
    use std::path::Path;

    #[test]
    fn test_for_project_paths() {
        let config = SuiteConfig::for_project("/work/snacks");
        assert_eq!(config.commands_dir, Path::new("/work/snacks/src/commands"));
        assert_eq!(config.store_dir, Path::new("/work/snacks/.booster"));
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.correlation_field, "id");
    }

    #[test]
    fn test_builders() {
        let config = SuiteConfig::for_project(".")
            .with_commands_dir("fixtures/commands")
            .with_store_dir("fixtures/.booster")
            .with_graphql_url("http://localhost:4000/graphql")
            .with_poll(PollConfig::new(50, 200))
            .with_correlation_field("orderId")
            .with_newest_first(true);

        assert_eq!(config.commands_dir, Path::new("fixtures/commands"));
        assert_eq!(config.http.graphql_url, "http://localhost:4000/graphql");
        assert_eq!(config.poll.timeout_ms, 200);
        assert_eq!(config.event_store().root(), Path::new("fixtures/.booster"));
    }

    #[test]
    fn test_session_carries_settings() {
        let config = SuiteConfig::for_project(".")
            .with_poll(PollConfig::new(10, 30))
            .with_correlation_field("orderId");
        let session = config.session(Arc::new(FakeTokenIssuer::new()));
        assert_eq!(session.poll_config(), PollConfig::new(10, 30));
        assert_eq!(session.correlation_field(), "orderId");
    }

    #[test]
    fn test_log_directive() {
        let log = LogConfig::new(Level::DEBUG);
        assert_eq!(log.directive(), "debug");
        assert!(!log.json);

        let log = log.with_filter("snackcheck_core=trace").with_json(true);
        assert_eq!(log.directive(), "snackcheck_core=trace");
        assert_eq!(SuiteConfig::for_project(".").log.directive(), "info");
    }

    #[test]
    fn test_log_defaults_when_missing_from_file() {
        let mut value = serde_json::to_value(SuiteConfig::for_project(".")).unwrap();
        value.as_object_mut().unwrap().remove("log");
        let config: SuiteConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.log.level, "info");
    }
}
