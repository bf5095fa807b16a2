//! Properties of the variable sets and mutation documents built for any
//! parameter list.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{json, Value};
use snackcheck_core::{build_mutation, ParamType, ParameterSpec, RandomFiller, VariableSets};

fn param_type() -> impl Strategy<Value = ParamType> {
    prop_oneof![
        Just(ParamType::String),
        Just(ParamType::Int),
        Just(ParamType::Boolean),
        Just(ParamType::Id),
    ]
}

fn example_for(param_type: &ParamType, seed: u32) -> Value {
    match param_type {
        ParamType::Int => json!(seed),
        ParamType::Boolean => json!(seed % 2 == 0),
        _ => json!(format!("example-{seed}")),
    }
}

fn parameters() -> impl Strategy<Value = Vec<ParameterSpec>> {
    prop::collection::btree_map(
        "p[a-zA-Z0-9_]{0,8}",
        (param_type(), any::<bool>(), prop::option::of(any::<u32>())),
        0..7,
    )
    .prop_map(|specs: BTreeMap<String, (ParamType, bool, Option<u32>)>| {
        specs
            .into_iter()
            .map(|(name, (ty, required, example))| {
                let spec = ParameterSpec::new(&name, ty.clone(), required);
                match example {
                    Some(seed) => spec.with_valid_example(example_for(&ty, seed)),
                    None => spec,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn all_set_covers_every_parameter_with_conforming_values(
        params in parameters(),
        seed in any::<u64>(),
    ) {
        let sets = VariableSets::synthesize_with(&params, &mut RandomFiller::seeded(seed)).unwrap();

        let keys: Vec<&str> = sets.all.keys().map(String::as_str).collect();
        let mut names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        prop_assert_eq!(keys_sorted, names);

        for p in &params {
            let value = &sets.all[&p.name];
            match &p.valid_example {
                Some(example) => prop_assert_eq!(value, example),
                None => prop_assert!(p.param_type.accepts(value), "{} = {}", p.name, value),
            }
        }
    }

    #[test]
    fn required_only_set_has_exactly_the_required_parameters(
        params in parameters(),
        seed in any::<u64>(),
    ) {
        let sets = VariableSets::synthesize_with(&params, &mut RandomFiller::seeded(seed)).unwrap();
        for p in &params {
            prop_assert_eq!(sets.required_only.contains_key(&p.name), p.required);
        }
        prop_assert_eq!(
            sets.required_only.len(),
            params.iter().filter(|p| p.required).count()
        );
    }

    #[test]
    fn empty_and_invalid_sets_cover_every_parameter(
        params in parameters(),
        seed in any::<u64>(),
    ) {
        let sets = VariableSets::synthesize_with(&params, &mut RandomFiller::seeded(seed)).unwrap();
        prop_assert_eq!(sets.empty.len(), params.len());
        prop_assert_eq!(sets.invalid_type.len(), params.len());
        for p in &params {
            prop_assert_eq!(&sets.empty[&p.name], &json!(""));
            prop_assert!(!p.param_type.accepts(&sets.invalid_type[&p.name]));
        }
    }

    #[test]
    fn mutation_round_trips_through_the_parser(
        command in "[A-Z][a-zA-Z0-9]{0,12}",
        params in parameters(),
    ) {
        let document = build_mutation(&command, &params).unwrap();
        prop_assert_eq!(document.operation_name().unwrap(), command.clone());

        let expected: Vec<(String, String)> = params
            .iter()
            .map(|p| {
                let bang = if p.required { "!" } else { "" };
                (p.name.clone(), format!("{}{bang}", p.param_type))
            })
            .collect();
        prop_assert_eq!(document.variable_definitions().unwrap(), expected);

        for p in &params {
            let field = format!("{0}: ${0}", p.name);
            prop_assert!(document.text().contains(&field));
        }
    }

    #[test]
    fn mutation_building_is_deterministic(
        command in "[A-Z][a-zA-Z0-9]{0,12}",
        params in parameters(),
    ) {
        prop_assert_eq!(
            build_mutation(&command, &params).unwrap(),
            build_mutation(&command, &params).unwrap()
        );
    }
}

#[test]
fn unsupported_parameter_type_fails_both_builders() {
    let params = vec![ParameterSpec::new(
        "when",
        ParamType::Unsupported("Date".to_string()),
        true,
    )];
    assert!(VariableSets::synthesize(&params).is_err());
    assert!(build_mutation("OrderSnack", &params).is_err());
}
