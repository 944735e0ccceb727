use std::collections::HashMap;

use async_trait::async_trait;
use papertrail_application::{ReferenceTitle, ReferenceTitleResolver};
use papertrail_core::AppResult;
use tokio::sync::RwLock;

/// In-memory reference title resolver implementation.
///
/// Titles can be inserted and removed at runtime, which also makes this the
/// adapter of choice for exercising the renderer's deleted-row fallback.
#[derive(Debug, Default)]
pub struct InMemoryReferenceTitleResolver {
    titles: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryReferenceTitleResolver {
    /// Creates an empty in-memory resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            titles: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the display title of a referenced record.
    pub async fn insert_title(
        &self,
        entity_logical_name: impl Into<String>,
        record_id: impl Into<String>,
        title: impl Into<String>,
    ) {
        self.titles
            .write()
            .await
            .insert((entity_logical_name.into(), record_id.into()), title.into());
    }

    /// Removes a referenced record, as a deletion would.
    pub async fn remove_title(&self, entity_logical_name: &str, record_id: &str) {
        self.titles
            .write()
            .await
            .remove(&(entity_logical_name.to_owned(), record_id.to_owned()));
    }
}

#[async_trait]
impl ReferenceTitleResolver for InMemoryReferenceTitleResolver {
    async fn resolve_title(
        &self,
        entity_logical_name: &str,
        record_id: &str,
    ) -> AppResult<Option<ReferenceTitle>> {
        Ok(self
            .titles
            .read()
            .await
            .get(&(entity_logical_name.to_owned(), record_id.to_owned()))
            .map(|title| ReferenceTitle {
                record_id: record_id.to_owned(),
                title: title.clone(),
            }))
    }
}
