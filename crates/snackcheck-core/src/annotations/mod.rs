//! Annotation Parser
//!
//! Mines a command's metadata from its source text: authorization roles,
//! accepted parameters, declared work items and registered events.
//!
//! The source is tokenized by a line lexer ([`lexer`]) and annotation values
//! are read with a structured literal parser ([`literal`]); no annotation text
//! is ever evaluated.

pub mod lexer;
pub mod literal;

mod events;
mod parameters;
mod roles;
mod work;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::{compute_source_digest, CommandMetadata};

use literal::{is_identifier, parse_lenient, parse_literal, Literal};

pub use events::parse_registered_events;
pub use parameters::parse_parameters;
pub use roles::parse_roles;
pub use work::parse_work_items;

/// Parse a command source, expanding input placeholders with random values.
pub fn parse_command_source(command_name: &str, source: &str) -> Result<CommandMetadata> {
    parse_command_source_with(command_name, source, &mut RandomFiller::new())
}

/// Parse a command source with an explicit filler for input placeholders.
pub fn parse_command_source_with(
    command_name: &str,
    source: &str,
    filler: &mut dyn FillerSource,
) -> Result<CommandMetadata> {
    let tokens = lexer::tokenize(source)?;

    let metadata = CommandMetadata {
        command_name: command_name.to_string(),
        roles: roles::roles_from_tokens(&tokens)?,
        parameters: parameters::parameters_from_tokens(&tokens)?,
        work_items: work::work_items_from_tokens(&tokens, filler)?,
        registered_events: events::events_from_tokens(&tokens, filler)?,
        source_digest: compute_source_digest(source),
    };

    debug!(
        command = %command_name,
        parameters = metadata.parameters.len(),
        work_items = metadata.work_items.len(),
        events = metadata.registered_events.len(),
        "Parsed command annotations"
    );
    Ok(metadata)
}

pub(crate) fn strip_quotes(text: &str) -> &str {
    text.trim().trim_matches(|c| matches!(c, '\'' | '"' | '`')).trim()
}

/// Read an `-inputs` / `@requiredInputs` object literal.
///
/// The legacy `{ name: 'fruit', value: 'apple' }` pair form reads as
/// `{ fruit: 'apple' }`.
pub(crate) fn parse_inputs(
    line: usize,
    text: &str,
    filler: &mut dyn FillerSource,
) -> Result<Map<String, Value>> {
    let literal = parse_literal(text)
        .map_err(|e| CoreError::parse(line, format!("invalid inputs '{text}': {e}")))?;

    let entries = match literal {
        Literal::Object(entries) => entries,
        _ => {
            return Err(CoreError::parse(
                line,
                format!("inputs must be an object literal, found '{text}'"),
            ))
        }
    };

    let legacy_pair = match entries.as_slice() {
        [(name_key, Literal::String(name)), (value_key, value)]
            if name_key == "name" && value_key == "value" =>
        {
            Some((name.clone(), value.clone()))
        }
        _ => None,
    };
    let entries = match legacy_pair {
        Some(pair) => vec![pair],
        None => entries,
    };

    let mut inputs = Map::new();
    for (key, value) in &entries {
        inputs.insert(key.clone(), value.resolve(filler));
    }
    Ok(inputs)
}

/// Read an entity name: a bare or quoted identifier.
pub(crate) fn parse_entity(line: usize, text: &str) -> Result<String> {
    match parse_lenient(text) {
        Ok(Literal::String(name)) if is_identifier(&name) => Ok(name),
        _ => Err(CoreError::parse(
            line,
            format!("entity must be an identifier, found '{text}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_inputs_object() {
        let inputs = parse_inputs(1, "{ fruit: 'apple', drink: 'water' }", &mut RandomFiller::seeded(1))
            .unwrap();
        assert_eq!(Value::Object(inputs), json!({"fruit": "apple", "drink": "water"}));
    }

    #[test]
    fn test_parse_inputs_legacy_pair() {
        let inputs =
            parse_inputs(1, "{ name: 'fruit', value: 'apple' }", &mut RandomFiller::seeded(1))
                .unwrap();
        assert_eq!(Value::Object(inputs), json!({"fruit": "apple"}));
    }

    #[test]
    fn test_parse_inputs_rejects_non_object() {
        let err = parse_inputs(4, "['apple']", &mut RandomFiller::seeded(1)).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: Some(4), .. }));
    }

    #[test]
    fn test_parse_entity() {
        assert_eq!(parse_entity(1, "'Fruit'").unwrap(), "Fruit");
        assert_eq!(parse_entity(1, "Drink").unwrap(), "Drink");
        assert!(parse_entity(1, "'two words'").is_err());
        assert!(parse_entity(1, "").is_err());
    }
}
