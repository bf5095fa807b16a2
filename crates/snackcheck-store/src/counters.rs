//! Item counts for the local datastore tables.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::StoreResult;
use crate::local::{
    read_datastore, CONNECTIONS_FILE, EVENTS_FILE, READ_MODELS_FILE, SUBSCRIPTIONS_FILE,
};

/// Counts records in the local provider's tables.
#[derive(Debug, Clone)]
pub struct LocalCounters {
    root: PathBuf,
}

impl LocalCounters {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub async fn events(&self) -> StoreResult<usize> {
        self.count_table_items(EVENTS_FILE, None).await
    }

    /// Count read-model records mentioning `read_model_name`.
    pub async fn read_models(&self, read_model_name: &str) -> StoreResult<usize> {
        self.count_table_items(READ_MODELS_FILE, Some(read_model_name))
            .await
    }

    pub async fn subscriptions(&self) -> StoreResult<usize> {
        self.count_table_items(SUBSCRIPTIONS_FILE, None).await
    }

    pub async fn connections(&self) -> StoreResult<usize> {
        self.count_table_items(CONNECTIONS_FILE, None).await
    }

    async fn count_table_items(&self, file: &str, search_term: Option<&str>) -> StoreResult<usize> {
        let items: Vec<Value> = read_datastore(&self.root.join(file)).await?;
        let count = match search_term {
            Some(term) => {
                let term = term.to_lowercase();
                items
                    .iter()
                    .filter(|item| item.to_string().to_lowercase().contains(&term))
                    .count()
            }
            None => items.len(),
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_and_search_term() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(EVENTS_FILE),
            "{\"kind\":\"event\"}\n{\"kind\":\"snapshot\"}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(READ_MODELS_FILE),
            "{\"typeName\":\"FruitReadModel\"}\n{\"typeName\":\"DrinkReadModel\"}\n{\"typeName\":\"FRUITREADMODEL\"}\n",
        )
        .unwrap();

        let counters = LocalCounters::new(dir.path());
        assert_eq!(counters.events().await.unwrap(), 2);
        assert_eq!(counters.read_models("fruitreadmodel").await.unwrap(), 2);
        assert_eq!(counters.read_models("Drink").await.unwrap(), 1);
        assert!(counters.subscriptions().await.unwrap_err().is_not_found());
    }
}
