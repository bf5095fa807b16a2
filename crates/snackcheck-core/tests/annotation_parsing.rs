//! Mines the fixture command sources and checks the annotation grammar end to end.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use snackcheck_core::{
    load_command_source, parse_command_source, parse_command_source_with, parse_parameters,
    parse_roles, parse_work_items, CoreError, Expectation, ParamType, ParameterSpec, RandomFiller,
    RoleSpec,
};

fn commands_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/commands")
}

#[tokio::test]
async fn order_snack_fixture_is_fully_mined() {
    let source = load_command_source(&commands_dir(), "OrderSnack").await.unwrap();
    let metadata =
        parse_command_source_with("OrderSnack", &source, &mut RandomFiller::seeded(3)).unwrap();

    assert_eq!(metadata.command_name, "OrderSnack");
    assert_eq!(metadata.roles, RoleSpec::All);
    assert_eq!(
        metadata.parameters,
        vec![
            ParameterSpec::new("fruit", ParamType::String, true),
            ParameterSpec::new("drink", ParamType::String, false)
                .with_valid_example(json!("water")),
            ParameterSpec::new("id", ParamType::Id, false),
        ]
    );

    let work = &metadata.work_items;
    assert_eq!(work.len(), 2);
    assert_eq!(work[0].description, "capitalize the 'fruit' value");
    assert_eq!(Value::Object(work[0].test_inputs.clone()), json!({"fruit": "apple"}));
    assert_eq!(work[0].evaluated_entity, "Fruit");
    assert_eq!(work[0].should_have, Some(Expectation::Values(vec![json!("Apple")])));
    assert_eq!(work[0].should_not_have, Some(Expectation::Values(vec![json!("apple")])));
    assert_eq!(work[1].evaluated_entity, "Tattle");
    assert_eq!(work[1].should_have, Some(Expectation::Exists));

    let events: Vec<(&str, &str)> = metadata
        .registered_events
        .iter()
        .map(|e| (e.event_name.as_str(), e.evaluated_entity.as_str()))
        .collect();
    assert_eq!(
        events,
        vec![
            ("FruitOrdered", "Fruit"),
            ("DrinkOrdered", "Drink"),
            ("CandyOrdered", "Tattle"),
        ]
    );
    let drink_inputs = &metadata.registered_events[1].triggering_input;
    assert!(drink_inputs["fruit"].is_string());
    assert_eq!(drink_inputs["drink"], "water");
    assert_eq!(metadata.registered_events[2].triggering_input["fruit"], "candy");

    assert_eq!(metadata.source_digest.len(), 64);
}

#[tokio::test]
async fn order_cocktail_fixture_uses_legacy_work_tags() {
    let source = load_command_source(&commands_dir(), "OrderCocktail").await.unwrap();
    let metadata = parse_command_source("OrderCocktail", &source).unwrap();

    assert_eq!(
        metadata.roles,
        RoleSpec::Roles(vec!["Mom".to_string(), "Dad".to_string()])
    );
    assert_eq!(metadata.parameters.len(), 2);
    assert!(metadata.parameters[0].required);

    let item = &metadata.work_items[0];
    assert_eq!(item.label(), "work01");
    assert_eq!(Value::Object(item.test_inputs.clone()), json!({"drink": "gimlet"}));
    assert_eq!(item.should_have, Some(Expectation::Values(vec![json!("Gimlet")])));
}

#[test]
fn open_command_with_optional_drink() {
    let source = r#"
@Command({
  authorize: 'all',
})
export class OrderSnack {
  public constructor(
    readonly fruit: string,
    readonly drink?: string,
  ) {}
}
"#;
    assert_eq!(parse_roles(source).unwrap(), RoleSpec::All);
    let params = parse_parameters(source).unwrap();
    assert_eq!(
        params,
        vec![
            ParameterSpec::new("fruit", ParamType::String, true),
            ParameterSpec::new("drink", ParamType::String, false),
        ]
    );
}

#[test]
fn work_block_with_result_alias() {
    let source = "\
// @work01: capitalize the 'fruit' value
// @work01-inputs: { fruit: 'apple' }
// @work01-entity: 'Fruit'
// @work01-result: 'Apple'
";
    let items = parse_work_items(source).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].ordinal, 1);
    assert_eq!(items[0].evaluated_entity, "Fruit");
    assert_eq!(items[0].should_have, Some(Expectation::Values(vec![json!("Apple")])));
}

#[test]
fn work_block_missing_entity_is_reported() {
    let source = "\
// @work01: capitalize the 'fruit' value
// @work01-inputs: { fruit: 'apple' }
// @work01-shouldHave: 'Apple'
";
    match parse_work_items(source).unwrap_err() {
        CoreError::MissingAnnotation { subject, tag } => {
            assert_eq!(subject, "work01");
            assert_eq!(tag, "@work01-entity");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn source_without_authorization_is_a_parse_error() {
    let err = parse_command_source("Nothing", "export class Nothing {}").unwrap_err();
    assert!(matches!(err, CoreError::Parse { line: None, .. }));
}

#[tokio::test]
async fn missing_source_file_names_the_path() {
    let err = load_command_source(&commands_dir(), "OrderPizza").await.unwrap_err();
    assert!(matches!(err, CoreError::Io(_)));
    assert!(err.to_string().contains("order-pizza.ts"));
}

#[tokio::test]
async fn legacy_order_snack_with_trailing_tags_is_mined() {
    let legacy = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy");
    let source = load_command_source(&legacy, "OrderSnack").await.unwrap();
    let metadata = parse_command_source("OrderSnack", &source).unwrap();

    assert_eq!(metadata.roles, RoleSpec::All);
    assert_eq!(metadata.parameters.len(), 3);

    let work = &metadata.work_items;
    assert_eq!(work.len(), 2);
    assert_eq!(work[0].description, "capitalize the 'fruit' value");
    assert_eq!(Value::Object(work[0].test_inputs.clone()), json!({"fruit": "apple"}));
    assert_eq!(work[0].evaluated_entity, "Fruit");
    assert_eq!(work[0].should_have, Some(Expectation::Values(vec![json!("Apple")])));
    assert_eq!(work[0].should_not_have, None);
    assert_eq!(Value::Object(work[1].test_inputs.clone()), json!({"fruit": "candy"}));
    assert_eq!(work[1].evaluated_entity, "Tattle");
    assert_eq!(work[1].should_have, Some(Expectation::Exists));

    let events: Vec<(&str, &str)> = metadata
        .registered_events
        .iter()
        .map(|e| (e.event_name.as_str(), e.evaluated_entity.as_str()))
        .collect();
    assert_eq!(
        events,
        vec![
            ("FruitOrdered", "Fruit"),
            ("DrinkOrdered", "Drink"),
            ("CandyOrdered", "Tattle"),
        ]
    );
    assert_eq!(metadata.registered_events[2].triggering_input["fruit"], "candy");
}
