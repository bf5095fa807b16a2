//! Command source lookup.
//!
//! Commands live at `<commands_dir>/<kebab-name>.ts`, next to an optional
//! `<kebab-name>.toml` declaration that takes precedence when present.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::annotations::parse_command_source;
use crate::declaration::load_declaration;
use crate::error::{CoreError, Result};
use crate::metadata::CommandMetadata;

/// `OrderSnack` -> `order-snack`.
pub fn pascal_to_kebab_case(name: &str) -> String {
    split_words(name, '-').to_lowercase()
}

/// `OrderSnack` -> `Order Snack`.
pub fn pascal_to_title_case(name: &str) -> String {
    split_words(name, ' ')
}

/// Insert `sep` wherever a lowercase letter is followed by an uppercase one.
fn split_words(name: &str, sep: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push(sep);
        }
        prev_lower = c.is_ascii_lowercase();
        out.push(c);
    }
    out
}

pub fn command_source_path(commands_dir: &Path, command_name: &str) -> PathBuf {
    commands_dir.join(format!("{}.ts", pascal_to_kebab_case(command_name)))
}

pub fn command_declaration_path(commands_dir: &Path, command_name: &str) -> PathBuf {
    commands_dir.join(format!("{}.toml", pascal_to_kebab_case(command_name)))
}

/// Read a command's source text.
pub async fn load_command_source(commands_dir: &Path, command_name: &str) -> Result<String> {
    let path = command_source_path(commands_dir, command_name);
    tokio::fs::read_to_string(&path).await.map_err(|e| {
        CoreError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Load a command's metadata, preferring a declaration file over mining the
/// source annotations.
pub async fn load_command_metadata(
    commands_dir: &Path,
    command_name: &str,
) -> Result<CommandMetadata> {
    let declaration = command_declaration_path(commands_dir, command_name);
    if tokio::fs::try_exists(&declaration).await? {
        info!(command = %command_name, path = %declaration.display(), "Loading command declaration");
        let metadata = load_declaration(&declaration).await?.into_metadata()?;
        if metadata.command_name != command_name {
            return Err(CoreError::Declaration(format!(
                "{} declares command '{}', expected '{command_name}'",
                declaration.display(),
                metadata.command_name
            )));
        }
        return Ok(metadata);
    }

    let source = load_command_source(commands_dir, command_name).await?;
    info!(command = %command_name, "Mining command source annotations");
    parse_command_source(command_name, &source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(pascal_to_kebab_case("OrderSnack"), "order-snack");
        assert_eq!(pascal_to_kebab_case("OrderCocktail"), "order-cocktail");
        assert_eq!(pascal_to_kebab_case("Ping"), "ping");
        assert_eq!(pascal_to_kebab_case("OrderHTTPRequest"), "order-httprequest");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(pascal_to_title_case("OrderSnack"), "Order Snack");
    }

    #[test]
    fn test_source_path() {
        assert_eq!(
            command_source_path(Path::new("src/commands"), "OrderSnack"),
            PathBuf::from("src/commands/order-snack.ts")
        );
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_command_source(dir.path(), "OrderSnack").await.unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
        assert!(err.to_string().contains("order-snack.ts"));
    }
}
