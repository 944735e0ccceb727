use async_trait::async_trait;
use papertrail_core::AppResult;
use papertrail_domain::{AuditEventType, AuditRecord};
use uuid::Uuid;

/// Port for persisting and reading append-only audit records.
///
/// Records are immutable after write; the only permitted update is a one-time
/// backfill of the rendered message.
#[async_trait]
pub trait AuditTrailRepository: Send + Sync {
    /// Persists one audit record and returns the stored row.
    async fn append(&self, record: AuditRecord) -> AppResult<AuditRecord>;

    /// Lists all records for a subject, newest first.
    async fn list_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> AppResult<Vec<AuditRecord>>;

    /// Lists records for a subject filtered by event type, newest first.
    async fn list_for_subject_by_event(
        &self,
        subject_type: &str,
        subject_id: &str,
        event_type: &AuditEventType,
    ) -> AppResult<Vec<AuditRecord>>;

    /// Counts all records for a subject.
    async fn count_for_subject(&self, subject_type: &str, subject_id: &str) -> AppResult<usize>;

    /// Backfills the rendered message of a persisted record.
    async fn store_rendered_message(&self, record_id: Uuid, message: &str) -> AppResult<()>;
}
