//! Explicit command declarations
//!
//! A TOML file stating the same metadata the annotations would, consumed
//! directly by the scenario generator:
//!
//! ```toml
//! command = "OrderSnack"
//! roles = "all"                 # or ["Mom", "Dad"]
//!
//! [[parameters]]
//! name = "drink"
//! type = "String"
//! required = false
//! valid_example = "water"
//!
//! [[work]]
//! description = "capitalize the 'fruit' value"
//! inputs = { fruit = "apple" }
//! entity = "Fruit"
//! should_have = ["Apple"]       # or true / false
//!
//! [[events]]
//! event = "FruitOrdered"
//! inputs = { fruit = "$string" }
//! entity = "Fruit"
//! ```
//!
//! Input values `"$string"`, `"$number"`, `"$boolean"` and `"$id"` are
//! placeholders for random, type-conformant values.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::annotations::literal::{is_identifier, Placeholder};
use crate::error::{CoreError, Result};
use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::{
    compute_source_digest, CommandMetadata, Expectation, ParamType, ParameterSpec,
    RegisteredEventSpec, RoleSpec, WorkItem,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RolesDeclaration {
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub valid_example: Option<Value>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OutcomeDeclaration {
    Flag(bool),
    Many(Vec<Value>),
    One(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkDeclaration {
    pub description: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    pub entity: String,
    #[serde(default)]
    pub should_have: Option<OutcomeDeclaration>,
    #[serde(default)]
    pub should_not_have: Option<OutcomeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventDeclaration {
    pub event: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    pub entity: String,
}

/// Parsed declaration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandDeclaration {
    pub command: String,
    pub roles: RolesDeclaration,
    #[serde(default)]
    pub parameters: Vec<ParameterDeclaration>,
    #[serde(default)]
    pub work: Vec<WorkDeclaration>,
    #[serde(default)]
    pub events: Vec<EventDeclaration>,
    #[serde(skip)]
    source_digest: String,
}

/// Read and parse a declaration file.
pub async fn load_declaration(path: &Path) -> Result<CommandDeclaration> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_declaration(&text)
        .map_err(|e| CoreError::Declaration(format!("{}: {e}", path.display())))
}

/// Parse declaration TOML text.
pub fn parse_declaration(text: &str) -> Result<CommandDeclaration> {
    let mut declaration: CommandDeclaration =
        toml::from_str(text).map_err(|e| CoreError::Declaration(e.to_string()))?;
    declaration.source_digest = compute_source_digest(text);
    Ok(declaration)
}

impl CommandDeclaration {
    /// Validate and convert, expanding placeholders with random values.
    pub fn into_metadata(self) -> Result<CommandMetadata> {
        self.into_metadata_with(&mut RandomFiller::new())
    }

    pub fn into_metadata_with(self, filler: &mut dyn FillerSource) -> Result<CommandMetadata> {
        if !is_identifier(&self.command) {
            return Err(CoreError::Declaration(format!(
                "invalid command name '{}'",
                self.command
            )));
        }

        let roles = match self.roles {
            RolesDeclaration::Single(role) if role == "all" => RoleSpec::All,
            RolesDeclaration::Single(role) => RoleSpec::Roles(vec![role]),
            RolesDeclaration::List(roles) if roles.is_empty() => {
                return Err(CoreError::Declaration("roles list is empty".to_string()))
            }
            RolesDeclaration::List(roles) if roles.iter().any(|r| r == "all") => {
                if roles.len() > 1 {
                    return Err(CoreError::Declaration(
                        "'all' cannot be combined with named roles".to_string(),
                    ));
                }
                RoleSpec::All
            }
            RolesDeclaration::List(roles) => RoleSpec::Roles(roles),
        };

        let mut parameters: Vec<ParameterSpec> = Vec::with_capacity(self.parameters.len());
        for p in self.parameters {
            if parameters.iter().any(|existing| existing.name == p.name) {
                return Err(CoreError::Declaration(format!(
                    "duplicate parameter '{}'",
                    p.name
                )));
            }
            let param_type = ParamType::from_graphql(&p.param_type);
            if let Some(example) = &p.valid_example {
                if !matches!(param_type, ParamType::Unsupported(_)) && !param_type.accepts(example) {
                    return Err(CoreError::Declaration(format!(
                        "valid_example {example} for parameter '{}' does not match type {}",
                        p.name, p.param_type
                    )));
                }
            }
            let mut spec = ParameterSpec::new(&p.name, param_type, p.required);
            spec.valid_example = p.valid_example;
            parameters.push(spec);
        }

        let mut work_items = Vec::with_capacity(self.work.len());
        for (idx, w) in self.work.into_iter().enumerate() {
            let ordinal = u8::try_from(idx + 1)
                .map_err(|_| CoreError::Declaration("too many work items".to_string()))?;
            work_items.push(work_item(ordinal, w, filler)?);
        }

        let registered_events = self
            .events
            .into_iter()
            .map(|e| RegisteredEventSpec {
                triggering_input: expand_inputs(e.inputs, filler),
                evaluated_entity: e.entity,
                event_name: e.event,
            })
            .collect();

        Ok(CommandMetadata {
            command_name: self.command,
            roles,
            parameters,
            work_items,
            registered_events,
            source_digest: self.source_digest,
        })
    }
}

fn work_item(ordinal: u8, w: WorkDeclaration, filler: &mut dyn FillerSource) -> Result<WorkItem> {
    let label = format!("work{ordinal:02}");
    let mut item = WorkItem {
        ordinal,
        description: w.description,
        test_inputs: expand_inputs(w.inputs, filler),
        evaluated_entity: w.entity,
        should_have: None,
        should_not_have: None,
    };

    for (outcome, should_have) in [(w.should_have, true), (w.should_not_have, false)] {
        let Some(outcome) = outcome else { continue };
        let (positive, expectation) = match outcome {
            OutcomeDeclaration::Flag(flag) => (flag == should_have, Expectation::Exists),
            OutcomeDeclaration::Many(values) => (should_have, Expectation::Values(values)),
            OutcomeDeclaration::One(value) => (should_have, Expectation::Values(vec![value])),
        };
        if let Expectation::Values(values) = &expectation {
            if values.is_empty() || values.iter().any(|v| v.is_object() || v.is_array() || v.is_null()) {
                return Err(CoreError::Declaration(format!(
                    "{label}: expected values must be non-empty scalars"
                )));
            }
        }
        let slot = if positive {
            &mut item.should_have
        } else {
            &mut item.should_not_have
        };
        if slot.as_ref().is_some_and(|existing| *existing != expectation) {
            return Err(CoreError::Declaration(format!(
                "{label}: conflicting expectations"
            )));
        }
        *slot = Some(expectation);
    }

    if item.should_have.is_none() && item.should_not_have.is_none() {
        return Err(CoreError::MissingAnnotation {
            subject: label,
            tag: "should_have".to_string(),
        });
    }
    Ok(item)
}

fn placeholder(value: &Value) -> Option<Placeholder> {
    match value.as_str()? {
        "$string" => Some(Placeholder::String),
        "$number" => Some(Placeholder::Number),
        "$boolean" => Some(Placeholder::Boolean),
        "$id" => Some(Placeholder::Id),
        _ => None,
    }
}

fn expand_inputs(inputs: Map<String, Value>, filler: &mut dyn FillerSource) -> Map<String, Value> {
    inputs
        .into_iter()
        .map(|(key, value)| {
            let value = match placeholder(&value) {
                Some(p) => p.fill(filler),
                None => value,
            };
            (key, value)
        })
        .collect()
}
