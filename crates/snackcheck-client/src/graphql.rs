//! GraphQL wire types and the client seams used by scenarios.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,

    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl GraphqlRequest {
    pub fn new(document: &str, variables: &Map<String, Value>) -> Self {
        Self {
            query: document.to_string(),
            variables: variables.clone(),
        }
    }
}

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlErrorEntry>,
}

impl GraphqlResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            data: None,
            errors: vec![GraphqlErrorEntry {
                message: message.to_string(),
                extra: Map::new(),
            }],
        }
    }

    /// Turn the response into its `data`, or a `Rejected` error when the
    /// server reported errors.
    pub fn into_data(self) -> ClientResult<Value> {
        if !self.errors.is_empty() {
            let message = self
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::Rejected { message });
        }
        match self.data {
            Some(Value::Null) | None => Err(ClientError::InvalidResponse(
                "response carried neither data nor errors".to_string(),
            )),
            Some(data) => Ok(data),
        }
    }
}

/// GraphQL client bound to one actor (anonymous or a role token).
#[async_trait]
pub trait GraphqlClient: Send + Sync {
    /// Send a raw request and return the decoded response body.
    async fn execute(&self, request: &GraphqlRequest) -> ClientResult<GraphqlResponse>;

    /// Submit a mutation and return its `data`.
    async fn mutate(&self, document: &str, variables: &Map<String, Value>) -> ClientResult<Value> {
        self.execute(&GraphqlRequest::new(document, variables))
            .await?
            .into_data()
    }

    /// Run a query and return its `data`.
    async fn query(&self, document: &str, variables: &Map<String, Value>) -> ClientResult<Value> {
        self.execute(&GraphqlRequest::new(document, variables))
            .await?
            .into_data()
    }
}

/// Builds clients for an actor, optionally carrying a bearer token.
pub trait ClientFactory: Send + Sync {
    fn client(&self, token: Option<&str>) -> ClientResult<Arc<dyn GraphqlClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_data_ok() {
        let response = GraphqlResponse::ok(json!({"OrderSnack": true}));
        assert_eq!(response.into_data().unwrap(), json!({"OrderSnack": true}));
    }

    #[test]
    fn test_into_data_joins_error_messages() {
        let response: GraphqlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [
                {"message": "A fruit is required.", "path": ["OrderSnack"]},
                {"message": "second"}
            ]
        }))
        .unwrap();

        let err = response.into_data().unwrap_err();
        assert!(err.is_rejection());
        assert!(err.to_string().contains("A fruit is required.; second"));
    }

    #[test]
    fn test_into_data_without_data_or_errors() {
        let err = GraphqlResponse::default().into_data().unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_request_serializes_variables() {
        let mut vars = Map::new();
        vars.insert("fruit".to_string(), json!("apple"));
        let body = serde_json::to_value(GraphqlRequest::new("mutation X { X }", &vars)).unwrap();
        assert_eq!(body["variables"]["fruit"], "apple");
        assert_eq!(body["query"], "mutation X { X }");
    }
}
