//! Mutation Builder
//!
//! Builds the single-operation GraphQL mutation document a command is
//! submitted with. Building is pure and deterministic; every document is
//! checked with `graphql-parser` before it is returned.

use graphql_parser::query::{parse_query, Definition, OperationDefinition};
use serde::Serialize;

use crate::annotations::literal::is_identifier;
use crate::error::{CoreError, Result};
use crate::metadata::ParameterSpec;

/// A validated mutation document for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationDocument {
    command_name: String,
    text: String,
}

impl MutationDocument {
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Name of the mutation operation, read back from the parsed document.
    pub fn operation_name(&self) -> Result<String> {
        let document = parse_query::<String>(&self.text)
            .map_err(|e| CoreError::InvalidDocument(e.to_string()))?;
        document
            .definitions
            .into_iter()
            .find_map(|def| match def {
                Definition::Operation(OperationDefinition::Mutation(m)) => m.name,
                _ => None,
            })
            .ok_or_else(|| CoreError::InvalidDocument("no named mutation".to_string()))
    }

    /// Declared variables as `(name, type)` pairs, e.g. `("fruit", "String!")`.
    pub fn variable_definitions(&self) -> Result<Vec<(String, String)>> {
        let document = parse_query::<String>(&self.text)
            .map_err(|e| CoreError::InvalidDocument(e.to_string()))?;
        Ok(document
            .definitions
            .into_iter()
            .filter_map(|def| match def {
                Definition::Operation(OperationDefinition::Mutation(m)) => {
                    Some(m.variable_definitions)
                }
                _ => None,
            })
            .flatten()
            .map(|v| (v.name, v.var_type.to_string()))
            .collect())
    }
}

impl std::fmt::Display for MutationDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

pub(crate) fn is_graphql_name(name: &str) -> bool {
    !name.contains('$') && is_identifier(name)
}

/// Build `mutation Name($a: T!, ...) { Name(input: { a: $a, ... }) }`.
pub fn build_mutation(command_name: &str, parameters: &[ParameterSpec]) -> Result<MutationDocument> {
    if !is_graphql_name(command_name) {
        return Err(CoreError::InvalidDocument(format!(
            "'{command_name}' is not a valid operation name"
        )));
    }

    let mut variables = Vec::with_capacity(parameters.len());
    let mut fields = Vec::with_capacity(parameters.len());
    for p in parameters {
        let type_name = p
            .param_type
            .graphql_name()
            .ok_or_else(|| CoreError::UnsupportedType {
                parameter: p.name.clone(),
                raw: String::from(p.param_type.clone()),
            })?;
        if !is_graphql_name(&p.name) {
            return Err(CoreError::InvalidDocument(format!(
                "'{}' is not a valid variable name",
                p.name
            )));
        }
        let bang = if p.required { "!" } else { "" };
        variables.push(format!("${}: {type_name}{bang}", p.name));
        fields.push(format!("{0}: ${0}", p.name));
    }

    let text = if variables.is_empty() {
        format!("mutation {command_name} {{\n  {command_name}(input: {{}})\n}}\n")
    } else {
        format!(
            "mutation {command_name}({}) {{\n  {command_name}(input: {{ {} }})\n}}\n",
            variables.join(", "),
            fields.join(", ")
        )
    };

    parse_query::<String>(&text).map_err(|e| CoreError::InvalidDocument(e.to_string()))?;

    Ok(MutationDocument {
        command_name: command_name.to_string(),
        text,
    })
}
