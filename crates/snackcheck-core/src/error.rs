//! Error taxonomy for snackcheck-core.

use snackcheck_client::ClientError;
use snackcheck_store::StoreError;

use crate::poll::PollTimeout;

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

/// Errors produced while building a command's test suite.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing annotation; fatal to suite construction.
    #[error("parse error{}: {message}", at_line(.line))]
    Parse {
        line: Option<usize>,
        message: String,
    },

    /// A work item or event annotation group is incomplete.
    #[error("missing annotation {tag} for {subject}")]
    MissingAnnotation { subject: String, tag: String },

    #[error("parameter '{parameter}' has unsupported type '{raw}'")]
    UnsupportedType { parameter: String, raw: String },

    #[error("invalid GraphQL document: {0}")]
    InvalidDocument(String),

    #[error("invalid command declaration: {0}")]
    Declaration(String),

    #[error(transparent)]
    PollTimeout(#[from] PollTimeout),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        CoreError::Parse {
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn parse_file(message: impl Into<String>) -> Self {
        CoreError::Parse {
            line: None,
            message: message.into(),
        }
    }
}

/// Result type for snackcheck-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_and_without_line() {
        let err = CoreError::parse(12, "expected ':'");
        assert_eq!(err.to_string(), "parse error (line 12): expected ':'");

        let err = CoreError::parse_file("no authorize declaration found");
        assert_eq!(err.to_string(), "parse error: no authorize declaration found");
    }

    #[test]
    fn test_missing_annotation_names_subject_and_tag() {
        let err = CoreError::MissingAnnotation {
            subject: "work01".to_string(),
            tag: "@work01-entity".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("work01"));
        assert!(msg.contains("@work01-entity"));
    }
}
