//! Actor tokens for authorization scenarios.
//!
//! Token issuance belongs to the Application Under Test's auth provider; this
//! crate only hands out tokens that were configured ahead of the run.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Environment variable holding `role=token` pairs separated by commas.
pub const ROLE_TOKENS_ENV: &str = "SNACKCHECK_ROLE_TOKENS";

/// Hands out a bearer token for a user acting in a role.
pub trait TokenIssuer: Send + Sync {
    fn for_user(&self, email: &str, role: &str) -> ClientResult<String>;
}

/// Issues pre-configured tokens keyed by role name.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIssuer {
    tokens: BTreeMap<String, String>,
}

impl StaticTokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tokens from `SNACKCHECK_ROLE_TOKENS` (`Mom=abc,Dad=def`).
    pub fn from_env() -> ClientResult<Self> {
        match std::env::var(ROLE_TOKENS_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Parse `role=token` pairs separated by commas.
    pub fn parse(raw: &str) -> ClientResult<Self> {
        let mut issuer = Self::new();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (role, token) = pair.split_once('=').ok_or_else(|| {
                ClientError::InvalidResponse(format!("malformed role token pair '{pair}'"))
            })?;
            issuer = issuer.with_token(role.trim(), token.trim());
        }
        Ok(issuer)
    }

    /// Register a token for a role.
    pub fn with_token(mut self, role: &str, token: &str) -> Self {
        self.tokens.insert(role.to_string(), token.to_string());
        self
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}

impl TokenIssuer for StaticTokenIssuer {
    fn for_user(&self, email: &str, role: &str) -> ClientResult<String> {
        debug!(email = %email, role = %role, "Issuing configured role token");
        self.tokens
            .get(role)
            .cloned()
            .ok_or_else(|| ClientError::MissingToken {
                role: role.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let issuer = StaticTokenIssuer::parse("Mom=abc, Dad = def ,").unwrap();
        assert_eq!(issuer.for_user("a@b.c", "Mom").unwrap(), "abc");
        assert_eq!(issuer.for_user("a@b.c", "Dad").unwrap(), "def");
        assert_eq!(issuer.roles().collect::<Vec<_>>(), vec!["Dad", "Mom"]);
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        assert!(StaticTokenIssuer::parse("Mom").is_err());
    }

    #[test]
    fn test_missing_role() {
        let err = StaticTokenIssuer::new()
            .for_user("a@b.c", "Grandma")
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken { role } if role == "Grandma"));
    }
}
