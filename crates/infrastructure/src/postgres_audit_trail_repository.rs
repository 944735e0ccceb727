use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use papertrail_application::AuditTrailRepository;
use papertrail_core::{AppError, AppResult};
use papertrail_domain::{AuditEventType, AuditRecord, ChangePayload};


/// PostgreSQL-backed repository for audit records.
#[derive(Clone)]
pub struct PostgresAuditTrailRepository {
    pool: PgPool,
}

impl PostgresAuditTrailRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRecordRow {
    id: Uuid,
    subject_type: String,
    subject_id: String,
    event_type: String,
    field_ident: Option<String>,
    change_data: String,
    actor_id: Option<String>,
    actor_display_name: Option<String>,
    rendered_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRecordRow {
    fn into_record(self) -> AppResult<AuditRecord> {
        let event_type = AuditEventType::parse(self.event_type.as_str())?;
        let change_value = serde_json::from_str(self.change_data.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "stored change data for audit record '{}' is not valid JSON: {error}",
                self.id
            ))
        })?;
        let change_data = ChangePayload::from_value(&event_type, change_value)?;

        AuditRecord::from_parts(
            self.id,
            self.subject_type,
            self.subject_id,
            event_type,
            self.field_ident,
            change_data,
            self.actor_id,
            self.actor_display_name,
            self.rendered_message,
            self.created_at,
        )
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        subject_type,
        subject_id,
        event_type,
        field_ident,
        change_data,
        actor_id,
        actor_display_name,
        rendered_message,
        created_at
    FROM audit_records
"#;

#[async_trait]
impl AuditTrailRepository for PostgresAuditTrailRepository {
    async fn append(&self, record: AuditRecord) -> AppResult<AuditRecord> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (
                id,
                subject_type,
                subject_id,
                event_type,
                field_ident,
                change_data,
                actor_id,
                actor_display_name,
                rendered_message,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id())
        .bind(record.subject_type().as_str())
        .bind(record.subject_id().as_str())
        .bind(record.event_type().as_str())
        .bind(record.field_ident())
        .bind(record.change_data().to_value().to_string())
        .bind(record.actor_id())
        .bind(record.actor_display_name())
        .bind(record.rendered_message())
        .bind(record.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit record: {error}")))?;

        debug!(
            record_id = %record.id(),
            event_type = record.event_type().as_str(),
            "appended audit record"
        );

        Ok(record)
    }

    async fn list_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecordRow>(&format!(
            "{SELECT_COLUMNS} WHERE subject_type = $1 AND subject_id = $2 ORDER BY created_at DESC"
        ))
        .bind(subject_type)
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit records: {error}")))?;

        rows.into_iter().map(AuditRecordRow::into_record).collect()
    }

    async fn list_for_subject_by_event(
        &self,
        subject_type: &str,
        subject_id: &str,
        event_type: &AuditEventType,
    ) -> AppResult<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditRecordRow>(&format!(
            "{SELECT_COLUMNS} WHERE subject_type = $1 AND subject_id = $2 AND event_type = $3 ORDER BY created_at DESC"
        ))
        .bind(subject_type)
        .bind(subject_id)
        .bind(event_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit records: {error}")))?;

        rows.into_iter().map(AuditRecordRow::into_record).collect()
    }

    async fn count_for_subject(&self, subject_type: &str, subject_id: &str) -> AppResult<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_records WHERE subject_type = $1 AND subject_id = $2",
        )
        .bind(subject_type)
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit records: {error}")))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn store_rendered_message(&self, record_id: Uuid, message: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE audit_records SET rendered_message = $2 WHERE id = $1")
            .bind(record_id)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to store rendered message: {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "audit record '{record_id}' does not exist"
            )));
        }

        Ok(())
    }
}
