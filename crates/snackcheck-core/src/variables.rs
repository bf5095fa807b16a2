//! Variable Set Synthesizer
//!
//! Builds the four equivalence-class input sets a command is tested with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::{ParamType, ParameterSpec};

/// Mapping from parameter name to concrete value.
pub type VariableSet = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSets {
    /// Every parameter, valid example or conforming random value.
    pub all: VariableSet,
    /// Required parameters only.
    pub required_only: VariableSet,
    /// Every parameter set to `""`.
    pub empty: VariableSet,
    /// Every parameter set to a value of a different type.
    pub invalid_type: VariableSet,
}

impl VariableSets {
    /// Synthesize with fresh random fillers.
    pub fn synthesize(parameters: &[ParameterSpec]) -> Result<Self> {
        Self::synthesize_with(parameters, &mut RandomFiller::new())
    }

    pub fn synthesize_with(
        parameters: &[ParameterSpec],
        filler: &mut dyn FillerSource,
    ) -> Result<Self> {
        let mut sets = VariableSets {
            all: Map::new(),
            required_only: Map::new(),
            empty: Map::new(),
            invalid_type: Map::new(),
        };

        for p in parameters {
            if let ParamType::Unsupported(raw) = &p.param_type {
                return Err(CoreError::UnsupportedType {
                    parameter: p.name.clone(),
                    raw: raw.clone(),
                });
            }

            sets.all.insert(p.name.clone(), valid_value(p, filler));
            if p.required {
                sets.required_only
                    .insert(p.name.clone(), valid_value(p, filler));
            }
            sets.empty.insert(p.name.clone(), Value::String(String::new()));
            sets.invalid_type
                .insert(p.name.clone(), invalid_value(&p.param_type, filler));
        }

        Ok(sets)
    }
}

fn valid_value(p: &ParameterSpec, filler: &mut dyn FillerSource) -> Value {
    if let Some(example) = &p.valid_example {
        return example.clone();
    }
    match p.param_type {
        ParamType::Int => Value::from(filler.int()),
        ParamType::Boolean => Value::Bool(filler.boolean()),
        ParamType::Id => Value::String(filler.id()),
        ParamType::String | ParamType::Unsupported(_) => Value::String(filler.word()),
    }
}

fn invalid_value(param_type: &ParamType, filler: &mut dyn FillerSource) -> Value {
    match param_type {
        ParamType::String => Value::from(filler.int()),
        ParamType::Int | ParamType::Boolean | ParamType::Unsupported(_) => {
            Value::String(filler.word())
        }
        ParamType::Id => Value::Bool(filler.boolean()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_snack() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new("fruit", ParamType::String, true),
            ParameterSpec::new("drink", ParamType::String, false).with_valid_example(json!("water")),
            ParameterSpec::new("id", ParamType::Id, false),
        ]
    }

    #[test]
    fn test_order_snack_sets() {
        let sets = VariableSets::synthesize_with(&order_snack(), &mut RandomFiller::seeded(4)).unwrap();

        let keys = |set: &VariableSet| set.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&sets.all), vec!["drink", "fruit", "id"]);
        assert_eq!(keys(&sets.required_only), vec!["fruit"]);
        assert_eq!(sets.all["drink"], json!("water"));
        assert!(uuid::Uuid::parse_str(sets.all["id"].as_str().unwrap()).is_ok());
        assert!(sets.empty.values().all(|v| v == ""));
        assert!(sets.invalid_type["fruit"].is_i64());
        assert!(sets.invalid_type["id"].is_boolean());
    }

    #[test]
    fn test_no_parameters() {
        let sets = VariableSets::synthesize(&[]).unwrap();
        assert!(sets.all.is_empty());
        assert!(sets.required_only.is_empty());
        assert!(sets.empty.is_empty());
        assert!(sets.invalid_type.is_empty());
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let params = vec![ParameterSpec::new("when", ParamType::Unsupported("Date".into()), true)];
        let err = VariableSets::synthesize(&params).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedType { parameter, raw } if parameter == "when" && raw == "Date"
        ));
    }

    #[test]
    fn test_fresh_values_each_run() {
        let params = vec![ParameterSpec::new("id", ParamType::Id, true)];
        let a = VariableSets::synthesize(&params).unwrap();
        let b = VariableSets::synthesize(&params).unwrap();
        assert_ne!(a.all["id"], b.all["id"]);
    }
}
