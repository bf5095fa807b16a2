//! Record shapes stored in the local datastore and the composite primary key
//! used to look them up.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Kind of an event-store record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A raw, immutable event.
    Event,

    /// A cached entity state built by reducing events.
    Snapshot,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Event => "event",
            RecordKind::Snapshot => "snapshot",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite event-store key: `{entityTypeName}-{entityID}-{kind}`.
///
/// The entity ID may itself contain `-` (UUIDs do), so decomposition anchors
/// on the trailing `-event` / `-snapshot` suffix and on the first delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey {
    pub entity_type_name: String,
    pub entity_id: String,
    pub kind: RecordKind,
}

impl PrimaryKey {
    pub fn new(entity_type_name: &str, entity_id: &str, kind: RecordKind) -> Self {
        Self {
            entity_type_name: entity_type_name.to_string(),
            entity_id: entity_id.to_string(),
            kind,
        }
    }

    /// Decompose a primary key string.
    pub fn parse(key: &str) -> StoreResult<Self> {
        let invalid = |reason: &str| StoreError::InvalidPrimaryKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let (rest, kind) = if let Some(rest) = key.strip_suffix("-event") {
            (rest, RecordKind::Event)
        } else if let Some(rest) = key.strip_suffix("-snapshot") {
            (rest, RecordKind::Snapshot)
        } else {
            return Err(invalid("expected a trailing -event or -snapshot"));
        };

        let (entity_type_name, entity_id) = rest
            .split_once('-')
            .ok_or_else(|| invalid("missing entity ID"))?;

        if entity_type_name.is_empty() {
            return Err(invalid("empty entity type name"));
        }
        if entity_id.is_empty() {
            return Err(invalid("empty entity ID"));
        }

        Ok(Self::new(entity_type_name, entity_id, kind))
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.entity_type_name, self.entity_id, self.kind)
    }
}

impl std::str::FromStr for PrimaryKey {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One line of `events.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// `event` or `snapshot` (kept as text so unknown kinds still load).
    pub kind: String,

    pub entity_type_name: String,

    #[serde(rename = "entityID")]
    pub entity_id: String,

    #[serde(default)]
    pub value: Value,

    /// Remaining envelope fields (`createdAt`, `requestID`, `typeName`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    pub fn new(kind: RecordKind, entity_type_name: &str, entity_id: &str, value: Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            entity_type_name: entity_type_name.to_string(),
            entity_id: entity_id.to_string(),
            value,
            extra: Map::new(),
        }
    }

    /// Whether this record matches the kind, type and ID encoded in `key`.
    ///
    /// Kind must match exactly, the entity type case-insensitively, and the
    /// entity ID may appear anywhere in the serialized record.
    pub fn matches(&self, key: &PrimaryKey) -> bool {
        self.kind == key.kind.as_str()
            && self.entity_type_name.to_lowercase() == key.entity_type_name.to_lowercase()
            && self.serialized().contains(&key.entity_id)
    }

    /// Full record as a JSON string.
    pub fn serialized(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Only the `value` payload as a JSON string.
    pub fn serialized_value(&self) -> String {
        serde_json::to_string(&self.value).unwrap_or_default()
    }
}

/// One line of `read_models.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadModelRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default)]
    pub value: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReadModelRecord {
    pub fn new(type_name: &str, value: Value) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            value,
            extra: Map::new(),
        }
    }

    /// Case-insensitive match on both the ID and the read model name anywhere
    /// in the serialized record.
    pub fn matches(&self, id: &str, read_model_name: &str) -> bool {
        let haystack = serde_json::to_string(self)
            .unwrap_or_default()
            .to_lowercase();
        haystack.contains(&id.to_lowercase()) && haystack.contains(&read_model_name.to_lowercase())
    }
}
