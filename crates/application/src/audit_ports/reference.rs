use async_trait::async_trait;
use papertrail_core::AppResult;

/// Id-and-title projection of a referenced record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTitle {
    /// Identifier of the referenced record.
    pub record_id: String,
    /// Display title of the referenced record.
    pub title: String,
}

/// Port for resolving foreign-key values to display titles at render time.
///
/// A missing row resolves to `None`; referenced records are routinely deleted
/// over the lifetime of an audit trail, so absence is not an error.
#[async_trait]
pub trait ReferenceTitleResolver: Send + Sync {
    /// Loads the id+title projection of a referenced record.
    async fn resolve_title(
        &self,
        entity_logical_name: &str,
        record_id: &str,
    ) -> AppResult<Option<ReferenceTitle>>;
}
