//! Contract tests for the local datastore adapter and the in-memory fake.
//!
//! Both implementations are driven with the same records and must agree.

use std::path::Path;

use serde_json::json;
use snackcheck_store::fakes::MemoryEventStore;
use snackcheck_store::{
    EventRecord, EventStore, LocalEventStore, ReadModelRecord, RecordKind, RecordOrder,
    EVENTS_FILE, READ_MODELS_FILE,
};

fn sample_events() -> Vec<EventRecord> {
    vec![
        EventRecord::new(RecordKind::Event, "Fruit", "abc123", json!({"fruit": "Apple"})),
        EventRecord::new(RecordKind::Snapshot, "Fruit", "abc123", json!({"fruit": "Apple"})),
        EventRecord::new(RecordKind::Event, "FRUIT", "abc123", json!({"fruit": "Pear"})),
        EventRecord::new(RecordKind::Event, "Drink", "abc123", json!({"drink": "Water"})),
        EventRecord::new(RecordKind::Event, "Fruit", "zzz999", json!({"fruit": "Plum"})),
        // entity ID differs but the correlation ID appears in the payload
        EventRecord::new(RecordKind::Event, "Fruit", "other", json!({"orderId": "abc123"})),
    ]
}

fn write_lines<T: serde::Serialize>(path: &Path, items: &[T]) {
    let mut data = String::new();
    for item in items {
        data.push_str(&serde_json::to_string(item).unwrap());
        data.push('\n');
    }
    std::fs::write(path, data).unwrap();
}

fn local_store() -> (tempfile::TempDir, LocalEventStore) {
    let dir = tempfile::tempdir().unwrap();
    write_lines(&dir.path().join(EVENTS_FILE), &sample_events());
    write_lines(
        &dir.path().join(READ_MODELS_FILE),
        &[
            ReadModelRecord::new("FruitReadModel", json!({"id": "abc123", "fruit": "Apple"})),
            ReadModelRecord::new("DrinkReadModel", json!({"id": "abc123", "drink": "Water"})),
        ],
    );
    let store = LocalEventStore::new(dir.path());
    (dir, store)
}

async fn assert_fruit_event_query(store: &dyn EventStore) {
    let records = store.events("Fruit-abc123-event").await.unwrap();

    assert_eq!(records.len(), 3, "got {records:?}");
    for record in &records {
        assert_eq!(record.kind, "event");
        assert_eq!(record.entity_type_name.to_lowercase(), "fruit");
        assert!(record.serialized().contains("abc123"));
    }
}

#[tokio::test]
async fn local_events_filter_by_kind_type_and_id() {
    let (_dir, store) = local_store();
    assert_fruit_event_query(&store).await;
}

#[tokio::test]
async fn memory_events_filter_by_kind_type_and_id() {
    let store = MemoryEventStore::new();
    for record in sample_events() {
        store.append_event(record);
    }
    assert_fruit_event_query(&store).await;
}

#[tokio::test]
async fn local_snapshot_query_returns_only_snapshots() {
    let (_dir, store) = local_store();
    let records = store.events("fruit-abc123-snapshot").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "snapshot");
}

#[tokio::test]
async fn local_order_can_be_reversed() {
    let (dir, store) = local_store();
    let as_written = store.events("Fruit-abc123-event").await.unwrap();

    let reversed = LocalEventStore::new(dir.path())
        .with_order(RecordOrder::Reversed)
        .events("Fruit-abc123-event")
        .await
        .unwrap();

    let mut expected = as_written.clone();
    expected.reverse();
    assert_eq!(reversed, expected);
}

#[tokio::test]
async fn local_read_models_match_id_and_name() {
    let (_dir, store) = local_store();
    let records = store.read_models("ABC123", "fruitreadmodel").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].type_name.as_deref(), Some("FruitReadModel"));
}

#[tokio::test]
async fn local_unknown_id_returns_empty() {
    let (_dir, store) = local_store();
    assert!(store.events("Fruit-nope-event").await.unwrap().is_empty());
}
