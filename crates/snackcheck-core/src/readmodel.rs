//! Read-model projection checks
//!
//! Builds `List<Entity>ReadModels` queries with a filter derived from the
//! fields a test expects, and runs them after a mutation has been projected.

use serde::Serialize;
use serde_json::{Map, Value};
use snackcheck_client::ClientError;
use snackcheck_store::{EventRecord, PrimaryKey, RecordKind};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::mutation::{is_graphql_name, MutationDocument};
use crate::poll::{try_wait_for_it, PollError};
use crate::scenario::{Actor, TestSession};
use crate::variables::VariableSet;

/// Field selected when a query asks for nothing in particular.
pub const DEFAULT_SELECTION: &str = "__typename";

/// A validated read-model list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDocument {
    read_model_name: String,
    text: String,
}

impl QueryDocument {
    pub fn read_model_name(&self) -> &str {
        &self.read_model_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Root field the response is keyed under, e.g. `ListFruitReadModels`.
    pub fn list_field(&self) -> String {
        format!("List{}s", self.read_model_name)
    }
}

impl std::fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the list query for `read_model_name`, selecting `fields` on each
/// item (or `__typename` when empty).
pub fn build_read_model_query(read_model_name: &str, fields: &[&str]) -> Result<QueryDocument> {
    if !is_graphql_name(read_model_name) {
        return Err(CoreError::InvalidDocument(format!(
            "'{read_model_name}' is not a valid read model name"
        )));
    }
    if let Some(bad) = fields.iter().find(|f| !is_graphql_name(f)) {
        return Err(CoreError::InvalidDocument(format!(
            "'{bad}' is not a valid field name"
        )));
    }

    let selection = if fields.is_empty() {
        DEFAULT_SELECTION.to_string()
    } else {
        fields.join(" ")
    };
    let rm = read_model_name;
    let text = format!(
        "query List{rm}s($filterBy: List{rm}Filter, $sortBy: {rm}SortBy, $limitTo: Int) {{\n  \
         List{rm}s(filter: $filterBy, sortBy: $sortBy, limit: $limitTo) {{\n    \
         items {{ {selection} }}\n  }}\n}}\n"
    );

    graphql_parser::parse_query::<String>(&text)
        .map_err(|e| CoreError::InvalidDocument(e.to_string()))?;

    Ok(QueryDocument {
        read_model_name: read_model_name.to_string(),
        text,
    })
}

/// One field a projected read model should carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCheck {
    pub field_name: String,
    pub should_contain: Value,
}

impl FieldCheck {
    pub fn new(field_name: &str, should_contain: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.to_string(),
            should_contain: should_contain.into(),
        }
    }

    /// Filter clause for this check; `None` when the value cannot be
    /// expressed as a list filter.
    fn filter_clause(&self) -> Option<Value> {
        let mut clause = Map::new();
        match &self.should_contain {
            Value::String(s) if is_json_string(s) => return None,
            Value::String(s) => {
                clause.insert("contains".to_string(), Value::String(s.clone()));
            }
            Value::Array(_) | Value::Object(_) => return None,
            scalar => {
                clause.insert("eq".to_string(), scalar.clone());
            }
        }
        Some(Value::Object(clause))
    }
}

/// True when `s` holds a serialized JSON object or array.
pub fn is_json_string(s: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(s.trim()),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

/// `{ field: { contains | eq: value }, ... }` for the checks that can be
/// filtered on.
pub fn build_filter(checks: &[FieldCheck]) -> Map<String, Value> {
    checks
        .iter()
        .filter_map(|check| {
            check
                .filter_clause()
                .map(|clause| (check.field_name.clone(), clause))
        })
        .collect()
}

/// Variables for a list query; absent options are left out.
pub fn query_variables(
    filter_by: Map<String, Value>,
    sort_by: Option<&Value>,
    limit_to: Option<u64>,
) -> Map<String, Value> {
    let mut variables = Map::new();
    variables.insert("filterBy".to_string(), Value::Object(filter_by));
    if let Some(sort_by) = sort_by {
        variables.insert("sortBy".to_string(), sort_by.clone());
    }
    if let Some(limit) = limit_to {
        variables.insert("limitTo".to_string(), Value::from(limit));
    }
    variables
}

/// What to look for in an entity's read model after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectionCheck {
    pub entity_name: String,
    pub fields: Vec<FieldCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ProjectionCheck {
    pub fn new(entity_name: &str) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field_name: &str, should_contain: impl Into<Value>) -> Self {
        self.fields.push(FieldCheck::new(field_name, should_contain));
        self
    }

    pub fn with_sort_by(mut self, sort_by: Value) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `FruitReadModel` for entity `Fruit`.
    pub fn read_model_name(&self) -> String {
        format!("{}ReadModel", self.entity_name)
    }

    pub fn query(&self) -> Result<QueryDocument> {
        let fields: Vec<&str> = self.fields.iter().map(|f| f.field_name.as_str()).collect();
        build_read_model_query(&self.read_model_name(), &fields)
    }

    pub fn variables(&self) -> Map<String, Value> {
        query_variables(build_filter(&self.fields), self.sort_by.as_ref(), self.limit)
    }
}

/// Submit `mutation` as `submit_as`, wait for the entity snapshot, then list
/// the entity's read models as `read_as` and return the matching items.
///
/// The correlation field from `variables` is reused when present, otherwise a
/// fresh UUID is added. A snapshot that never shows up is only logged; the
/// query still runs.
pub async fn evaluate_read_model_projection(
    session: &TestSession,
    submit_as: &Actor,
    read_as: &Actor,
    mutation: &MutationDocument,
    variables: &VariableSet,
    check: &ProjectionCheck,
) -> Result<Vec<Value>> {
    let field = session.correlation_field().to_string();
    let mut variables = variables.clone();
    let id = match variables.get(&field) {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            variables.insert(field, Value::String(id.clone()));
            id
        }
    };

    let submitter = session.client_for(submit_as)?;
    submitter.mutate(mutation.text(), &variables).await?;

    let key = PrimaryKey::new(&check.entity_name, &id, RecordKind::Snapshot).to_string();
    let outcome = try_wait_for_it(
        || {
            let store = session.store().clone();
            let key = key.clone();
            async move { store.events(&key).await }
        },
        |records: &Vec<EventRecord>| !records.is_empty(),
        session.poll_config(),
    )
    .await;
    match outcome {
        Ok(records) => debug!(key = %key, records = records.len(), "Snapshot projected"),
        Err(PollError::Timeout(timeout)) => {
            warn!(key = %key, timeout_ms = timeout.timeout_ms, "Command was not processed before timeout")
        }
        Err(PollError::Probe(e)) => return Err(e.into()),
    }

    let query = check.query()?;
    let reader = session.client_for(read_as)?;
    let data = reader.query(query.text(), &check.variables()).await?;

    let list_field = query.list_field();
    match data.get(&list_field).and_then(|list| list.get("items")) {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(ClientError::InvalidResponse(format!("response has no {list_field}.items list")).into()),
    }
}
