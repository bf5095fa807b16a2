//! Local provider datastore adapter.
//!
//! The local provider keeps one file per table under `.booster/`, each holding
//! newline-delimited JSON objects with an empty final line. The files carry no
//! composite key column, so lookups are derived from the primary key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{EventRecord, PrimaryKey, ReadModelRecord};
use crate::store_traits::EventStore;

/// Events table file name.
pub const EVENTS_FILE: &str = "events.json";
/// Read models table file name.
pub const READ_MODELS_FILE: &str = "read_models.json";
/// Subscriptions table file name.
pub const SUBSCRIPTIONS_FILE: &str = "subscriptions-store.json";
/// Connections table file name.
pub const CONNECTIONS_FILE: &str = "connections-store.json";
/// Default local datastore directory.
pub const DEFAULT_STORE_DIR: &str = ".booster";

/// Order in which records are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// File order (the provider appends, so oldest first).
    #[default]
    AsWritten,

    /// Reverse file order.
    Reversed,
}

/// Event store backed by the local provider's datastore files.
#[derive(Debug, Clone)]
pub struct LocalEventStore {
    root: PathBuf,
    order: RecordOrder,
}

impl LocalEventStore {
    /// Create an adapter rooted at a datastore directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            order: RecordOrder::default(),
        }
    }

    /// Set the order in which matching records are returned.
    pub fn with_order(mut self, order: RecordOrder) -> Self {
        self.order = order;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn apply_order<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.order == RecordOrder::Reversed {
            items.reverse();
        }
        items
    }
}

#[async_trait]
impl EventStore for LocalEventStore {
    async fn events(&self, primary_key: &str) -> StoreResult<Vec<EventRecord>> {
        let key = PrimaryKey::parse(primary_key)?;
        let path = self.root.join(EVENTS_FILE);
        let items: Vec<EventRecord> = self.apply_order(read_datastore(&path).await?);

        let matches: Vec<EventRecord> = items.into_iter().filter(|r| r.matches(&key)).collect();
        debug!(key = %key, matches = matches.len(), "Queried local events");
        Ok(matches)
    }

    async fn read_models(
        &self,
        id: &str,
        read_model_name: &str,
    ) -> StoreResult<Vec<ReadModelRecord>> {
        let path = self.root.join(READ_MODELS_FILE);
        let items: Vec<ReadModelRecord> = self.apply_order(read_datastore(&path).await?);

        let matches: Vec<ReadModelRecord> = items
            .into_iter()
            .filter(|r| r.matches(id, read_model_name))
            .collect();
        debug!(id = %id, read_model = %read_model_name, matches = matches.len(), "Queried local read models");
        Ok(matches)
    }
}

/// Read and parse a whole datastore file.
pub async fn read_datastore<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    parse_datastore(path, &data)
}

/// Parse newline-delimited JSON records. Blank lines (including the
/// provider's trailing empty line) are skipped.
pub fn parse_datastore<T: DeserializeOwned>(path: &Path, data: &str) -> StoreResult<Vec<T>> {
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_parse_datastore_skips_trailing_empty_line() {
        let data = "{\"a\":1}\n{\"a\":2}\n";
        let items: Vec<Value> = parse_datastore(Path::new("t.json"), data).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_datastore_reports_line_number() {
        let data = "{\"a\":1}\nnot json\n";
        let err = parse_datastore::<Value>(Path::new("t.json"), data).unwrap_err();
        match err {
            StoreError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_order() {
        let store = LocalEventStore::new(".");
        assert_eq!(store.apply_order(vec![1, 2, 3]), vec![1, 2, 3]);

        let store = store.with_order(RecordOrder::Reversed);
        assert_eq!(store.apply_order(vec![1, 2, 3]), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_missing_events_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEventStore::new(dir.path());
        let err = store.events("Fruit-abc-event").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected_before_io() {
        let store = LocalEventStore::new("/does/not/exist");
        let err = store.events("Fruit-abc").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPrimaryKey { .. }));
    }
}
