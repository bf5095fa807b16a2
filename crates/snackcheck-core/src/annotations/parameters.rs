use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::metadata::{ParamType, ParameterSpec};

use super::lexer::{tokenize, Token};
use super::literal::parse_lenient;
use super::strip_quotes;

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_$][\w$]*)\s*(\?)?\s*(?::\s*([^,)=;{]*))?")
            .expect("static pattern compiles")
    })
}

/// Read every `readonly` field of a command source, in declaration order.
pub fn parse_parameters(source: &str) -> Result<Vec<ParameterSpec>> {
    parameters_from_tokens(&tokenize(source)?)
}

pub(crate) fn parameters_from_tokens(tokens: &[Token]) -> Result<Vec<ParameterSpec>> {
    let mut parameters: Vec<ParameterSpec> = Vec::new();

    for token in tokens {
        let Token::ReadonlyField {
            line,
            declaration,
            example,
        } = token
        else {
            continue;
        };

        let caps = field_re().captures(declaration).ok_or_else(|| {
            CoreError::parse(*line, format!("malformed field declaration '{declaration}'"))
        })?;
        let name = caps[1].to_string();
        let type_text = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();
        if type_text.is_empty() {
            return Err(CoreError::parse(
                *line,
                format!("parameter '{name}' has no type annotation"),
            ));
        }

        let (param_type, nullable) = map_type(type_text);
        let required = caps.get(2).is_none() && !nullable;

        if parameters.iter().any(|p| p.name == name) {
            return Err(CoreError::parse(*line, format!("duplicate parameter '{name}'")));
        }

        let mut spec = ParameterSpec::new(&name, param_type, required);
        if let Some(text) = example {
            spec = spec.with_valid_example(example_value(text));
        }
        parameters.push(spec);
    }

    Ok(parameters)
}

/// Map a source type, treating `T | undefined` and `T | null` as an optional `T`.
fn map_type(type_text: &str) -> (ParamType, bool) {
    let parts: Vec<&str> = type_text.split('|').map(str::trim).collect();
    let kept: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| !matches!(*p, "undefined" | "null"))
        .collect();
    let nullable = kept.len() < parts.len();

    match kept.as_slice() {
        [single] => (ParamType::from_source_type(single), nullable),
        _ => (ParamType::Unsupported(type_text.to_string()), nullable),
    }
}

/// Numbers and booleans stay typed; anything else is a string with its
/// quotes stripped.
fn example_value(text: &str) -> Value {
    match parse_lenient(text) {
        Ok(literal) if literal.is_scalar() => literal
            .to_value()
            .unwrap_or_else(|| Value::String(strip_quotes(text).to_string())),
        _ => Value::String(strip_quotes(text).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORDER_SNACK: &str = r#"
export class OrderSnack {
  public constructor(
    readonly fruit: string,
    readonly drink?: string, // @validExample: 'water'
    readonly id?: UUID // an optional ID param is included for tests
  ) {}
}
"#;

    #[test]
    fn test_order_snack_parameters() {
        let params = parse_parameters(ORDER_SNACK).unwrap();
        assert_eq!(
            params,
            vec![
                ParameterSpec::new("fruit", ParamType::String, true),
                ParameterSpec::new("drink", ParamType::String, false)
                    .with_valid_example(json!("water")),
                ParameterSpec::new("id", ParamType::Id, false),
            ]
        );
    }

    #[test]
    fn test_single_line_constructor() {
        let params =
            parse_parameters("constructor(readonly count: number, readonly ok?: boolean) {}")
                .unwrap();
        assert_eq!(params[0], ParameterSpec::new("count", ParamType::Int, true));
        assert_eq!(params[1], ParameterSpec::new("ok", ParamType::Boolean, false));
    }

    #[test]
    fn test_union_with_undefined_is_optional() {
        let params = parse_parameters("readonly note: string | undefined,").unwrap();
        assert_eq!(params[0], ParameterSpec::new("note", ParamType::String, false));
    }

    #[test]
    fn test_unsupported_type_is_kept() {
        let params = parse_parameters("readonly when: Date,").unwrap();
        assert_eq!(params[0].param_type, ParamType::Unsupported("Date".to_string()));
    }

    #[test]
    fn test_numeric_valid_example_stays_typed() {
        let params = parse_parameters("readonly count?: number, // @validExample: 12").unwrap();
        assert_eq!(params[0].valid_example, Some(json!(12)));
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let err = parse_parameters("\n  readonly fruit,").unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: Some(2), .. }));
    }

    #[test]
    fn test_duplicate_parameter_is_an_error() {
        assert!(parse_parameters("readonly a: string,\nreadonly a: number").is_err());
    }

    #[test]
    fn test_commented_readonly_is_ignored() {
        let params = parse_parameters("// readonly ghost: string\nreadonly real: string").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "real");
    }

    #[test]
    fn test_readonly_inside_string_is_ignored() {
        let source = r#"
export class OrderSnack {
  public constructor(readonly fruit: string) {}

  public static async handle(command: OrderSnack, register: Register): Promise<void> {
    if (!command.fruit) {
      throw new Error('fruit is readonly once set')
    }
  }
}
"#;
        let params = parse_parameters(source).unwrap();
        assert_eq!(params, vec![ParameterSpec::new("fruit", ParamType::String, true)]);
    }
}
