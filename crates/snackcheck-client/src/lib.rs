//! snackcheck-client: Application Under Test client
//!
//! The Application Under Test is only reachable through its GraphQL API and
//! an auth provider. This crate provides the seams scenarios run against:
//!
//! - `GraphqlClient` / `ClientFactory`: one client per actor
//! - `HttpGraphqlClient`: reqwest-backed implementation
//! - `TokenIssuer` / `StaticTokenIssuer`: per-role bearer tokens
//!
//! ## Layer 1 - Transport

mod error;
pub mod fakes;
mod graphql;
mod http;
mod token;

pub use error::{ClientError, ClientResult};
pub use graphql::{ClientFactory, GraphqlClient, GraphqlErrorEntry, GraphqlRequest, GraphqlResponse};
pub use http::{HttpClientFactory, HttpConfig, HttpGraphqlClient, DEFAULT_GRAPHQL_URL};
pub use token::{StaticTokenIssuer, TokenIssuer, ROLE_TOKENS_ENV};
