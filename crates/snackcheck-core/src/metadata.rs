//! Command metadata mined from a command source or declared explicitly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use snackcheck_store::EventRecord;

/// GraphQL scalar type of a command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParamType {
    String,
    Int,
    Boolean,
    Id,
    /// A source type with no GraphQL mapping, kept verbatim.
    Unsupported(String),
}

impl ParamType {
    /// Map a command source type (`string`, `number`, `boolean`, `UUID`).
    pub fn from_source_type(raw: &str) -> Self {
        match raw.trim() {
            "string" => ParamType::String,
            "number" => ParamType::Int,
            "boolean" => ParamType::Boolean,
            "UUID" => ParamType::Id,
            other => ParamType::Unsupported(other.to_string()),
        }
    }

    /// Map a GraphQL type name (`String`, `Int`, `Boolean`, `ID`).
    pub fn from_graphql(name: &str) -> Self {
        match name.trim() {
            "String" => ParamType::String,
            "Int" => ParamType::Int,
            "Boolean" => ParamType::Boolean,
            "ID" => ParamType::Id,
            other => ParamType::Unsupported(other.to_string()),
        }
    }

    pub fn graphql_name(&self) -> Option<&'static str> {
        match self {
            ParamType::String => Some("String"),
            ParamType::Int => Some("Int"),
            ParamType::Boolean => Some("Boolean"),
            ParamType::Id => Some("ID"),
            ParamType::Unsupported(_) => None,
        }
    }

    /// Whether a runtime value conforms to this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String | ParamType::Id => value.is_string(),
            ParamType::Int => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Unsupported(_) => false,
        }
    }
}

impl From<String> for ParamType {
    fn from(name: String) -> Self {
        ParamType::from_graphql(&name)
    }
}

impl From<ParamType> for String {
    fn from(ty: ParamType) -> Self {
        match ty {
            ParamType::Unsupported(raw) => raw,
            other => other.graphql_name().unwrap_or_default().to_string(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Unsupported(raw) => write!(f, "<unsupported {raw}>"),
            other => f.write_str(other.graphql_name().unwrap_or_default()),
        }
    }
}

/// One input field accepted by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_example: Option<Value>,
}

impl ParameterSpec {
    pub fn new(name: &str, param_type: ParamType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required,
            valid_example: None,
        }
    }

    pub fn with_valid_example(mut self, example: Value) -> Self {
        self.valid_example = Some(example);
        self
    }
}

/// Authorization declared on a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSpec {
    All,
    Roles(Vec<String>),
}

impl RoleSpec {
    pub fn is_all(&self) -> bool {
        matches!(self, RoleSpec::All)
    }

    pub fn roles(&self) -> &[String] {
        match self {
            RoleSpec::All => &[],
            RoleSpec::Roles(roles) => roles,
        }
    }
}

/// What a snapshot must (or must not) show after the work is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// At least one record exists.
    Exists,
    /// The serialized record value contains these scalars.
    Values(Vec<Value>),
}

fn needle(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A declared unit of work a command performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub ordinal: u8,
    pub description: String,
    pub test_inputs: Map<String, Value>,
    pub evaluated_entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_have: Option<Expectation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_not_have: Option<Expectation>,
}

impl WorkItem {
    /// `work01`, `work02`, ...
    pub fn label(&self) -> String {
        format!("work{:02}", self.ordinal)
    }

    /// Check the expectations against the snapshots found for the entity.
    /// Both expectations must hold when both are present.
    pub fn evaluate(&self, records: &[EventRecord]) -> Result<(), String> {
        let serialized: Vec<String> = records.iter().map(EventRecord::serialized_value).collect();

        match &self.should_have {
            Some(Expectation::Exists) if serialized.is_empty() => {
                return Err(format!(
                    "expected a {} snapshot, found none",
                    self.evaluated_entity
                ));
            }
            Some(Expectation::Values(values)) => {
                let found = serialized
                    .iter()
                    .any(|s| values.iter().all(|v| s.contains(&needle(v))));
                if !found {
                    return Err(format!(
                        "no {} snapshot contains all of {}",
                        self.evaluated_entity,
                        Value::Array(values.clone())
                    ));
                }
            }
            _ => {}
        }

        match &self.should_not_have {
            Some(Expectation::Exists) if !serialized.is_empty() => {
                return Err(format!(
                    "expected no {} snapshot, found {}",
                    self.evaluated_entity,
                    serialized.len()
                ));
            }
            Some(Expectation::Values(values)) => {
                let offending = serialized
                    .iter()
                    .find(|s| values.iter().any(|v| s.contains(&needle(v))));
                if let Some(s) = offending {
                    return Err(format!(
                        "{} snapshot {s} contains one of {}",
                        self.evaluated_entity,
                        Value::Array(values.clone())
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// An event a command registers, with the input that triggers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredEventSpec {
    pub event_name: String,
    pub triggering_input: Map<String, Value>,
    pub evaluated_entity: String,
}

/// Everything known about one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub command_name: String,
    pub roles: RoleSpec,
    pub parameters: Vec<ParameterSpec>,
    pub work_items: Vec<WorkItem>,
    pub registered_events: Vec<RegisteredEventSpec>,
    /// Hex SHA-256 of the text the metadata was derived from.
    pub source_digest: String,
}

impl CommandMetadata {
    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters.iter().filter(|p| p.required)
    }

    pub fn has_required_parameters(&self) -> bool {
        self.parameters.iter().any(|p| p.required)
    }
}

/// Hex SHA-256 digest of source text.
pub fn compute_source_digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}
