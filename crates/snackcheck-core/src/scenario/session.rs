use std::sync::Arc;

use serde::Serialize;
use snackcheck_client::{ClientError, ClientFactory, GraphqlClient, TokenIssuer};
use snackcheck_store::EventStore;

use crate::poll::PollConfig;

/// Default input field carrying the correlation identifier.
pub const DEFAULT_CORRELATION_FIELD: &str = "id";

/// Who submits a scenario's mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Anonymous,
    Role { role: String, email: String },
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Anonymous => f.write_str("anonymous"),
            Actor::Role { role, email } => write!(f, "{email} ({role})"),
        }
    }
}

/// Collaborators one suite run talks to. Built per run and passed to every
/// scenario; nothing here is global.
#[derive(Clone)]
pub struct TestSession {
    clients: Arc<dyn ClientFactory>,
    tokens: Arc<dyn TokenIssuer>,
    store: Arc<dyn EventStore>,
    poll: PollConfig,
    correlation_field: String,
}

impl TestSession {
    pub fn new(
        clients: Arc<dyn ClientFactory>,
        tokens: Arc<dyn TokenIssuer>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            clients,
            tokens,
            store,
            poll: PollConfig::default(),
            correlation_field: DEFAULT_CORRELATION_FIELD.to_string(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_correlation_field(mut self, field: &str) -> Self {
        self.correlation_field = field.to_string();
        self
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    pub fn correlation_field(&self) -> &str {
        &self.correlation_field
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// A client acting as `actor`; role actors get a freshly issued token.
    pub fn client_for(&self, actor: &Actor) -> Result<Arc<dyn GraphqlClient>, ClientError> {
        match actor {
            Actor::Anonymous => self.clients.client(None),
            Actor::Role { role, email } => {
                let token = self.tokens.for_user(email, role)?;
                self.clients.client(Some(&token))
            }
        }
    }
}

impl std::fmt::Debug for TestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("poll", &self.poll)
            .field("correlation_field", &self.correlation_field)
            .finish_non_exhaustive()
    }
}
