//! In-process fakes for the client seams (testing only)
//!
//! `FakeClientFactory` routes every request through a handler closure, so a
//! test can stand in for the Application Under Test, and records what was sent.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};
use crate::graphql::{ClientFactory, GraphqlClient, GraphqlRequest, GraphqlResponse};
use crate::token::TokenIssuer;

/// Handler invoked for every request: `(token, request) -> response`.
pub type RequestHandler =
    Arc<dyn Fn(Option<&str>, &GraphqlRequest) -> GraphqlResponse + Send + Sync>;

/// A request as seen by the fake, with the actor's token.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub token: Option<String>,
    pub request: GraphqlRequest,
}

/// Client factory whose clients answer through a shared handler.
#[derive(Clone)]
pub struct FakeClientFactory {
    handler: RequestHandler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeClientFactory {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Option<&str>, &GraphqlRequest) -> GraphqlResponse + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeClientFactory {
    fn client(&self, token: Option<&str>) -> ClientResult<Arc<dyn GraphqlClient>> {
        Ok(Arc::new(FakeClient {
            token: token.map(str::to_string),
            handler: self.handler.clone(),
            requests: self.requests.clone(),
        }))
    }
}

struct FakeClient {
    token: Option<String>,
    handler: RequestHandler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[async_trait]
impl GraphqlClient for FakeClient {
    async fn execute(&self, request: &GraphqlRequest) -> ClientResult<GraphqlResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            token: self.token.clone(),
            request: request.clone(),
        });
        Ok((self.handler)(self.token.as_deref(), request))
    }
}

/// Token issuer returning `token-<role>` for every role except the denied ones.
#[derive(Debug, Clone, Default)]
pub struct FakeTokenIssuer {
    denied_roles: Vec<String>,
}

impl FakeTokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, role: &str) -> Self {
        self.denied_roles.push(role.to_string());
        self
    }
}

impl TokenIssuer for FakeTokenIssuer {
    fn for_user(&self, _email: &str, role: &str) -> ClientResult<String> {
        if self.denied_roles.iter().any(|r| r == role) {
            return Err(ClientError::MissingToken {
                role: role.to_string(),
            });
        }
        Ok(format!("token-{role}"))
    }
}
