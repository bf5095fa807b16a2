//! snackcheck-store: Local Event-Store Query Adapter
//!
//! Answers event and read-model lookups for black-box command tests by
//! reading the local provider's flat, append-only datastore files.
//!
//! ## Layer 0 - Data
//!
//! Focus: faithful decomposition of composite keys and read-only filtering.
//!
//! ## Key Components
//!
//! - `EventStore`: async lookup trait shared with remote implementations
//! - `LocalEventStore`: `.booster/*.json` adapter
//! - `LocalCounters`: table item counts
//! - `backup_datastores` / `restore_datastores`: run isolation helpers

mod backup;
mod counters;
mod error;
pub mod fakes;
mod local;
mod record;
pub mod store_traits;

pub use backup::{backup_datastores, restore_datastores, DEFAULT_BACKUP_SUFFIX};
pub use counters::LocalCounters;
pub use error::{StoreError, StoreResult};
pub use local::{
    parse_datastore, read_datastore, LocalEventStore, RecordOrder, CONNECTIONS_FILE,
    DEFAULT_STORE_DIR, EVENTS_FILE, READ_MODELS_FILE, SUBSCRIPTIONS_FILE,
};
pub use record::{EventRecord, PrimaryKey, ReadModelRecord, RecordKind};
pub use store_traits::EventStore;
