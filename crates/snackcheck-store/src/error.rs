//! Error types for snackcheck-store

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading the local datastore
#[derive(Error, Debug)]
pub enum StoreError {
    /// Datastore file could not be read or written
    #[error("Datastore I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A datastore line was not a JSON object
    #[error("Invalid datastore record at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Primary key did not match `{entityTypeName}-{entityID}-{event|snapshot}`
    #[error("Invalid primary key '{key}': {reason}")]
    InvalidPrimaryKey { key: String, reason: String },

    /// Restore was asked for but no `*.<suffix>` files exist
    #[error("No '.{suffix}' backups found in {dir}")]
    NoBackups { dir: PathBuf, suffix: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the underlying cause is a missing datastore file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_primary_key_display() {
        let err = StoreError::InvalidPrimaryKey {
            key: "Fruit".to_string(),
            reason: "missing kind suffix".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Fruit"));
        assert!(msg.contains("missing kind suffix"));
    }

    #[test]
    fn test_is_not_found() {
        let err = StoreError::io(
            "/nope/events.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());

        let err = StoreError::io(
            "/nope/events.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
    }
}
