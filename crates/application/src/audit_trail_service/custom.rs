use papertrail_core::AppResult;
use papertrail_domain::{AuditEventType, AuditRecord, ChangePayload};
use serde_json::{Map, Value};

use crate::audit_ports::{AuditSubject, LinkChange, SatelliteChange};
use crate::change_detector::is_blank;

use super::AuditTrailService;

impl AuditTrailService {
    /// Writes a custom record with an arbitrary key/value payload.
    ///
    /// Used for events where the changed-field model does not apply.
    pub async fn record_custom_event(
        &self,
        subject: &dyn AuditSubject,
        event_name: &str,
        data: Map<String, Value>,
    ) -> AppResult<Option<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(None);
        }

        let event_type = AuditEventType::custom(event_name)?;
        self.append_custom(subject, event_type, data).await.map(Some)
    }

    /// Writes a custom record for a many-to-many link being added or removed.
    pub async fn record_link_change(
        &self,
        subject: &dyn AuditSubject,
        change: LinkChange,
    ) -> AppResult<Option<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(None);
        }

        let event_name =
            format!("{}_{}", change.kind.as_str(), change.entity_logical_name).to_uppercase();
        let event_type = AuditEventType::custom(event_name)?;

        let mut data = Map::new();
        data.insert("record_id".to_owned(), Value::String(change.record_id));
        data.insert("title".to_owned(), Value::String(change.title));
        data.insert(
            "entity".to_owned(),
            Value::String(change.entity_logical_name),
        );

        self.append_custom(subject, event_type, data).await.map(Some)
    }

    /// Writes a custom record for a satellite model value change.
    ///
    /// Nothing is recorded when the satellite value is empty and unchanged.
    pub async fn record_satellite_change(
        &self,
        subject: &dyn AuditSubject,
        change: SatelliteChange,
    ) -> AppResult<Option<AuditRecord>> {
        if self.suppressed(subject) {
            return Ok(None);
        }

        if is_blank(&change.new_value) && change.old_value == change.new_value {
            return Ok(None);
        }

        let event_name = format!("{}_{}", change.kind.as_str(), change.model_name).to_uppercase();
        let event_type = AuditEventType::custom(event_name)?;

        let mut data = Map::new();
        data.insert("field_name".to_owned(), Value::String(change.field_name));
        data.insert("old_value".to_owned(), change.old_value);
        data.insert("new_value".to_owned(), change.new_value);

        self.append_custom(subject, event_type, data).await.map(Some)
    }

    async fn append_custom(
        &self,
        subject: &dyn AuditSubject,
        event_type: AuditEventType,
        data: Map<String, Value>,
    ) -> AppResult<AuditRecord> {
        let actor = self.current_actor().await?;
        let record = AuditRecord::new(
            subject.schema().entity().logical_name().as_str(),
            subject.subject_id(),
            event_type,
            None,
            ChangePayload::Custom(data),
            actor,
        )?;
        let message = self.renderer.render(&record, subject.schema()).await?;
        self.repository
            .append(record.with_rendered_message(message))
            .await
    }
}
