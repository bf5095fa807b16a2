use crate::error::{CoreError, Result};
use crate::metadata::RoleSpec;

use super::lexer::{tokenize, Token};
use super::literal::is_identifier;
use super::strip_quotes;

const ALL_ROLES: &str = "all";

/// Read the `authorize:` declaration of a command source.
pub fn parse_roles(source: &str) -> Result<RoleSpec> {
    roles_from_tokens(&tokenize(source)?)
}

pub(crate) fn roles_from_tokens(tokens: &[Token]) -> Result<RoleSpec> {
    let (line, value) = tokens
        .iter()
        .find_map(|t| match t {
            Token::Authorize { line, value } => Some((*line, value.trim())),
            _ => None,
        })
        .ok_or_else(|| CoreError::parse_file("no authorize declaration found"))?;

    let names: Vec<String> = match value.strip_prefix('[') {
        Some(rest) => {
            let inner = rest.split(']').next().unwrap_or_default();
            inner
                .split(',')
                .map(strip_quotes)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        }
        None => single_role(value).into_iter().collect(),
    };

    if names.is_empty() {
        return Err(CoreError::parse(line, "authorize declares no roles"));
    }
    if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
        return Err(CoreError::parse(line, format!("invalid role name '{bad}'")));
    }
    if names.iter().any(|n| n == ALL_ROLES) {
        if names.len() == 1 {
            return Ok(RoleSpec::All);
        }
        return Err(CoreError::parse(
            line,
            "'all' cannot be combined with named roles",
        ));
    }
    Ok(RoleSpec::Roles(names))
}

/// First quoted string or bare identifier in `value`.
fn single_role(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let first = chars.next()?;
    let name: String = if matches!(first, '\'' | '"' | '`') {
        chars.take_while(|c| *c != first).collect()
    } else {
        value
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .collect()
    };
    (!name.is_empty()).then_some(name)
}
