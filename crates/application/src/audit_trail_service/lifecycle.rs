use chrono::{DateTime, NaiveDate, NaiveTime};
use papertrail_core::AppResult;
use papertrail_domain::{
    AuditEventType, AuditRecord, ChangePayload, Classification, FieldChange,
};
use serde_json::Value;

use crate::audit_ports::{AuditSubject, DirtySnapshot};
use crate::change_detector::DetectedChange;

use super::AuditTrailService;

impl AuditTrailService {
    /// Writes one record for the creation of the subject.
    pub async fn record_created(
        &self,
        subject: &dyn AuditSubject,
    ) -> AppResult<Option<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(None);
        }

        let record = self
            .build_lifecycle_record(subject, AuditEventType::Created)
            .await?;
        Ok(Some(self.repository.append(record).await?))
    }

    /// Writes one record for the deletion of the subject.
    pub async fn record_deleted(
        &self,
        subject: &dyn AuditSubject,
    ) -> AppResult<Option<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(None);
        }

        let record = self
            .build_lifecycle_record(subject, AuditEventType::Deleted)
            .await?;
        Ok(Some(self.repository.append(record).await?))
    }

    /// Writes one record per field change surviving detection.
    ///
    /// The snapshot holds the prior values captured immediately before the
    /// write; the subject carries the post-write state.
    pub async fn record_field_changes(
        &self,
        subject: &dyn AuditSubject,
        snapshot: &DirtySnapshot,
    ) -> AppResult<Vec<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(Vec::new());
        }

        let changes = self.detector.detect(subject, snapshot);
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let actor = self.current_actor().await?;
        let subject_type = subject.schema().entity().logical_name().as_str();

        let mut records = Vec::with_capacity(changes.len());
        for change in changes {
            let payload = encode_change(&change);
            let record = AuditRecord::new(
                subject_type,
                subject.subject_id(),
                AuditEventType::FieldChanged,
                Some(change.field_name),
                payload,
                actor.clone(),
            )?;
            let message = self.renderer.render(&record, subject.schema()).await?;
            records.push(
                self.repository
                    .append(record.with_rendered_message(message))
                    .await?,
            );
        }

        Ok(records)
    }

    async fn build_lifecycle_record(
        &self,
        subject: &dyn AuditSubject,
        event_type: AuditEventType,
    ) -> AppResult<AuditRecord> {
        let actor = self.current_actor().await?;
        let record = AuditRecord::new(
            subject.schema().entity().logical_name().as_str(),
            subject.subject_id(),
            event_type,
            None,
            ChangePayload::None,
            actor,
        )?;
        let message = self.renderer.render(&record, subject.schema()).await?;
        Ok(record.with_rendered_message(message))
    }
}

fn encode_change(change: &DetectedChange) -> ChangePayload {
    match change.classification {
        Classification::NoValue => ChangePayload::None,
        Classification::Temporal(_) => ChangePayload::Field(FieldChange::new(
            change.field_type,
            encode_temporal(&change.old_value),
            encode_temporal(&change.new_value),
        )),
        _ => ChangePayload::Field(FieldChange::new(
            change.field_type,
            change.old_value.clone(),
            change.new_value.clone(),
        )),
    }
}

/// Normalizes a temporal value to an absolute RFC 3339 timestamp.
///
/// Date-only values become midnight UTC, time-only values land on the epoch
/// date; granularity-specific truncation happens at render time. Values that
/// fit no known shape are stored raw and degrade at render time.
fn encode_temporal(value: &Value) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Value::String(timestamp.to_rfc3339());
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Value::String(date.and_time(NaiveTime::MIN).and_utc().to_rfc3339());
    }

    for format in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(text, format) {
            if let Some(date) = NaiveDate::from_ymd_opt(1970, 1, 1) {
                return Value::String(date.and_time(time).and_utc().to_rfc3339());
            }
        }
    }

    value.clone()
}
