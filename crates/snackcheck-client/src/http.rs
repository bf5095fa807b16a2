//! GraphQL over HTTP
//!
//! Talks to the Application Under Test's GraphQL endpoint. The local provider
//! serves it at `http://localhost:3000/graphql` by default.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::graphql::{ClientFactory, GraphqlClient, GraphqlRequest, GraphqlResponse};

/// Default local provider endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:3000/graphql";

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// GraphQL endpoint URL
    pub graphql_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            graphql_url: std::env::var("SNACKCHECK_GRAPHQL_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string()),
            request_timeout_ms: std::env::var("SNACKCHECK_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

impl HttpConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint
    pub fn new(graphql_url: &str) -> Self {
        HttpConfig {
            graphql_url: graphql_url.to_string(),
            request_timeout_ms: 10_000,
        }
    }

    /// Local provider endpoint on a given port
    pub fn local(port: u16) -> Self {
        Self::new(&format!("http://localhost:{port}/graphql"))
    }
}

/// GraphQL client for one actor
pub struct HttpGraphqlClient {
    config: HttpConfig,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpGraphqlClient {
    /// Create a client, optionally authenticated with a bearer token
    pub fn new(config: HttpConfig, token: Option<&str>) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("snackcheck/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(HttpGraphqlClient {
            config,
            token: token.map(str::to_string),
            http_client,
        })
    }

    /// Check that the endpoint answers `query { __typename }`
    pub async fn ensure_ready(&self) -> ClientResult<()> {
        let not_ready = |reason: String| ClientError::NotReady {
            url: self.config.graphql_url.clone(),
            reason,
        };

        let data = self
            .query("query { __typename }", &Map::new())
            .await
            .map_err(|e| not_ready(e.to_string()))?;

        if data.get("__typename").is_some() {
            Ok(())
        } else {
            Err(not_ready("missing __typename".to_string()))
        }
    }
}

#[async_trait]
impl GraphqlClient for HttpGraphqlClient {
    async fn execute(&self, request: &GraphqlRequest) -> ClientResult<GraphqlResponse> {
        let mut builder = self.http_client.post(&self.config.graphql_url).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), authenticated = self.token.is_some(), "GraphQL response");

        match serde_json::from_str::<GraphqlResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => {
                Err(ClientError::Http(format!("{status}: {body}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds `HttpGraphqlClient`s for one endpoint
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: HttpConfig,
}

impl HttpClientFactory {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(&self, token: Option<&str>) -> ClientResult<Arc<dyn GraphqlClient>> {
        Ok(Arc::new(HttpGraphqlClient::new(self.config.clone(), token)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config_url() {
        let config = HttpConfig::local(4000);
        assert_eq!(config.graphql_url, "http://localhost:4000/graphql");
    }

    #[test]
    fn test_factory_builds_clients() {
        let factory = HttpClientFactory::new(HttpConfig::new(DEFAULT_GRAPHQL_URL));
        assert!(factory.client(None).is_ok());
        assert!(factory.client(Some("token")).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_not_ready() {
        // port 9 (discard) is closed on test machines
        let client = HttpGraphqlClient::new(HttpConfig::new("http://127.0.0.1:9/graphql"), None)
            .unwrap();
        let err = client.ensure_ready().await.unwrap_err();
        assert!(matches!(err, ClientError::NotReady { .. }));
    }
}
