use async_trait::async_trait;
use papertrail_application::AuditTrailRepository;
use papertrail_core::{AppError, AppResult};
use papertrail_domain::{AuditEventType, AuditRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory audit trail repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrailRepository {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditTrailRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuditTrailRepository for InMemoryAuditTrailRepository {
    async fn append(&self, record: AuditRecord) -> AppResult<AuditRecord> {
        let mut records = self.records.write().await;

        if records.iter().any(|stored| stored.id() == record.id()) {
            return Err(AppError::Conflict(format!(
                "audit record '{}' already exists",
                record.id()
            )));
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn list_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> AppResult<Vec<AuditRecord>> {
        let records = self.records.read().await;

        let mut listed: Vec<(usize, AuditRecord)> = records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| {
                (record.subject_type().as_str() == subject_type
                    && record.subject_id().as_str() == subject_id)
                    .then(|| (position, record.clone()))
            })
            .collect();

        // newest first; insertion order breaks same-timestamp ties
        listed.sort_by(|left, right| {
            right
                .1
                .created_at()
                .cmp(&left.1.created_at())
                .then(right.0.cmp(&left.0))
        });

        Ok(listed.into_iter().map(|(_, record)| record).collect())
    }

    async fn list_for_subject_by_event(
        &self,
        subject_type: &str,
        subject_id: &str,
        event_type: &AuditEventType,
    ) -> AppResult<Vec<AuditRecord>> {
        Ok(self
            .list_for_subject(subject_type, subject_id)
            .await?
            .into_iter()
            .filter(|record| record.event_type() == event_type)
            .collect())
    }

    async fn count_for_subject(&self, subject_type: &str, subject_id: &str) -> AppResult<usize> {
        let records = self.records.read().await;

        Ok(records
            .iter()
            .filter(|record| {
                record.subject_type().as_str() == subject_type
                    && record.subject_id().as_str() == subject_id
            })
            .count())
    }

    async fn store_rendered_message(&self, record_id: Uuid, message: &str) -> AppResult<()> {
        let mut records = self.records.write().await;

        let Some(record) = records.iter_mut().find(|record| record.id() == record_id) else {
            return Err(AppError::NotFound(format!(
                "audit record '{record_id}' does not exist"
            )));
        };

        *record = record.clone().with_rendered_message(message);
        Ok(())
    }
}
