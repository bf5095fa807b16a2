//! In-memory fake for the `EventStore` trait (testing only)

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::{EventRecord, PrimaryKey, ReadModelRecord};
use crate::store_traits::EventStore;

/// In-memory event store backed by append-only vectors.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<EventRecord>>,
    read_models: Mutex<Vec<ReadModelRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_event(&self, record: EventRecord) {
        self.events.lock().unwrap().push(record);
    }

    pub fn append_read_model(&self, record: ReadModelRecord) {
        self.read_models.lock().unwrap().push(record);
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn events(&self, primary_key: &str) -> StoreResult<Vec<EventRecord>> {
        let key = PrimaryKey::parse(primary_key)?;
        let events = self.events.lock().unwrap();
        Ok(events.iter().filter(|r| r.matches(&key)).cloned().collect())
    }

    async fn read_models(
        &self,
        id: &str,
        read_model_name: &str,
    ) -> StoreResult<Vec<ReadModelRecord>> {
        let read_models = self.read_models.lock().unwrap();
        Ok(read_models
            .iter()
            .filter(|r| r.matches(id, read_model_name))
            .cloned()
            .collect())
    }
}
