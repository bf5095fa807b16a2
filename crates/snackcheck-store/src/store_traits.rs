//! Query seam over the Application Under Test's event store.
//!
//! `LocalEventStore` reads the local provider's flat files; the in-memory fake
//! in `fakes` satisfies the same contract for tests.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::{EventRecord, ReadModelRecord};

/// Read-only event-store lookups.
///
/// Guarantees:
/// - `events(key)` returns only records of the key's kind, for the key's
///   entity type (case-insensitive), mentioning the key's entity ID.
/// - `read_models(id, name)` returns only records mentioning both `id` and
///   `name` (case-insensitive).
/// - A missing backing store is an error, never an empty result.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Look up records by a `{entityTypeName}-{entityID}-{event|snapshot}` key.
    async fn events(&self, primary_key: &str) -> StoreResult<Vec<EventRecord>>;

    /// Look up read-model records by ID and read model name.
    async fn read_models(&self, id: &str, read_model_name: &str)
        -> StoreResult<Vec<ReadModelRecord>>;
}
