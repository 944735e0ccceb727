use chrono::{DateTime, Utc};
use papertrail_core::{ActorIdentity, AppError, AppResult, NonEmptyString};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::metadata::FieldType;

/// Kind of event an audit record describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEventType {
    /// The subject record was created.
    Created,
    /// The subject record was deleted.
    Deleted,
    /// A single field of the subject record changed.
    FieldChanged,
    /// A freely named event outside the changed-field model.
    Custom(String),
}

impl AuditEventType {
    /// Creates a custom event type with a validated name.
    pub fn custom(name: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Custom(NonEmptyString::new(name)?.into()))
    }

    /// Returns a stable storage value for this event type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::FieldChanged => "field_changed",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Restores an event type from its storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "created" => Ok(Self::Created),
            "deleted" => Ok(Self::Deleted),
            "field_changed" => Ok(Self::FieldChanged),
            other => Self::custom(other),
        }
    }
}

/// Old/new value pair stored for one changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    field_type: FieldType,
    old_value: Value,
    new_value: Value,
}

impl FieldChange {
    /// Creates a stored field change payload.
    #[must_use]
    pub fn new(field_type: FieldType, old_value: Value, new_value: Value) -> Self {
        Self {
            field_type,
            old_value,
            new_value,
        }
    }

    /// Returns the field type captured at record time.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the stored old value.
    #[must_use]
    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    /// Returns the stored new value.
    #[must_use]
    pub fn new_value(&self) -> &Value {
        &self.new_value
    }
}

/// Structured change payload persisted with an audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangePayload {
    /// No stored values (creations, deletions, secret fields).
    None,
    /// Old/new pair for a single changed field.
    Field(FieldChange),
    /// Open key/value payload for custom events.
    Custom(Map<String, Value>),
}

impl ChangePayload {
    /// Serializes the payload into its stored JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Field(change) => {
                let mut map = Map::new();
                map.insert(
                    "field_type".to_owned(),
                    Value::String(change.field_type().as_str().to_owned()),
                );
                map.insert("old_value".to_owned(), change.old_value().clone());
                map.insert("new_value".to_owned(), change.new_value().clone());
                Value::Object(map)
            }
            Self::Custom(data) => Value::Object(data.clone()),
        }
    }

    /// Restores a payload from its stored JSON form for the given event type.
    pub fn from_value(event_type: &AuditEventType, value: Value) -> AppResult<Self> {
        match (event_type, value) {
            (_, Value::Null) => Ok(Self::None),
            (AuditEventType::FieldChanged, Value::Object(map)) => {
                let field_type = map
                    .get("field_type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "field change payload is missing field_type".to_owned(),
                        )
                    })?
                    .parse::<FieldType>()?;
                let old_value = map.get("old_value").cloned().unwrap_or(Value::Null);
                let new_value = map.get("new_value").cloned().unwrap_or(Value::Null);
                Ok(Self::Field(FieldChange::new(
                    field_type, old_value, new_value,
                )))
            }
            (AuditEventType::Custom(_), Value::Object(map)) => Ok(Self::Custom(map)),
            (event_type, _) => Err(AppError::Validation(format!(
                "change payload does not match event type '{}'",
                event_type.as_str()
            ))),
        }
    }
}

/// One immutable audit event row.
///
/// The subject is referenced weakly by type and identifier; audit records
/// outlive the subject record they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    id: Uuid,
    subject_type: NonEmptyString,
    subject_id: NonEmptyString,
    event_type: AuditEventType,
    field_ident: Option<NonEmptyString>,
    change_data: ChangePayload,
    actor_id: Option<String>,
    actor_display_name: Option<String>,
    rendered_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a new audit record with a generated id and current timestamp.
    pub fn new(
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        event_type: AuditEventType,
        field_ident: Option<String>,
        change_data: ChangePayload,
        actor: Option<ActorIdentity>,
    ) -> AppResult<Self> {
        let (actor_id, actor_display_name) = match actor {
            Some(actor) => (
                Some(actor.id().to_owned()),
                Some(actor.display_name().to_owned()),
            ),
            None => (None, None),
        };

        Self::from_parts(
            Uuid::new_v4(),
            subject_type,
            subject_id,
            event_type,
            field_ident,
            change_data,
            actor_id,
            actor_display_name,
            None,
            Utc::now(),
        )
    }

    /// Restores an audit record from persisted parts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        event_type: AuditEventType,
        field_ident: Option<String>,
        change_data: ChangePayload,
        actor_id: Option<String>,
        actor_display_name: Option<String>,
        rendered_message: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let field_ident = field_ident.map(NonEmptyString::new).transpose()?;

        match (&event_type, field_ident.is_some()) {
            (AuditEventType::FieldChanged, false) => {
                return Err(AppError::Validation(
                    "field_changed records require a field ident".to_owned(),
                ));
            }
            (AuditEventType::FieldChanged, true) => {}
            (_, true) => {
                return Err(AppError::Validation(
                    "field ident is only allowed for field_changed records".to_owned(),
                ));
            }
            (_, false) => {}
        }

        match (&event_type, &change_data) {
            (AuditEventType::FieldChanged, ChangePayload::Field(_) | ChangePayload::None) => {}
            (AuditEventType::Custom(_), ChangePayload::Custom(_) | ChangePayload::None) => {}
            (AuditEventType::Created | AuditEventType::Deleted, ChangePayload::None) => {}
            (event_type, _) => {
                return Err(AppError::Validation(format!(
                    "change payload does not match event type '{}'",
                    event_type.as_str()
                )));
            }
        }

        Ok(Self {
            id,
            subject_type: NonEmptyString::new(subject_type)?,
            subject_id: NonEmptyString::new(subject_id)?,
            event_type,
            field_ident,
            change_data,
            actor_id,
            actor_display_name,
            rendered_message,
            created_at,
        })
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the audited entity's logical name.
    #[must_use]
    pub fn subject_type(&self) -> &NonEmptyString {
        &self.subject_type
    }

    /// Returns the audited record's identifier.
    #[must_use]
    pub fn subject_id(&self) -> &NonEmptyString {
        &self.subject_id
    }

    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> &AuditEventType {
        &self.event_type
    }

    /// Returns the changed field name for field_changed records.
    #[must_use]
    pub fn field_ident(&self) -> Option<&str> {
        self.field_ident.as_ref().map(NonEmptyString::as_str)
    }

    /// Returns the structured change payload.
    #[must_use]
    pub fn change_data(&self) -> &ChangePayload {
        &self.change_data
    }

    /// Returns the acting user's identifier captured at write time.
    #[must_use]
    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// Returns the acting user's display name captured at write time.
    #[must_use]
    pub fn actor_display_name(&self) -> Option<&str> {
        self.actor_display_name.as_deref()
    }

    /// Returns the precomputed human-readable message, if rendered.
    #[must_use]
    pub fn rendered_message(&self) -> Option<&str> {
        self.rendered_message.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attaches a rendered message to an unrendered record.
    #[must_use]
    pub fn with_rendered_message(mut self, message: impl Into<String>) -> Self {
        self.rendered_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::metadata::FieldType;

    use super::{AuditEventType, AuditRecord, ChangePayload, FieldChange};

    #[test]
    fn field_changed_records_require_field_ident() {
        let result = AuditRecord::new(
            "contact",
            "1",
            AuditEventType::FieldChanged,
            None,
            ChangePayload::None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn created_records_reject_field_payload() {
        let change = FieldChange::new(FieldType::Text, json!("a"), json!("b"));
        let result = AuditRecord::new(
            "contact",
            "1",
            AuditEventType::Created,
            None,
            ChangePayload::Field(change),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn field_payload_round_trips_through_storage_form() {
        let change = FieldChange::new(FieldType::Date, json!("2020-01-01T00:00:00+00:00"), json!(null));
        let payload = ChangePayload::Field(change);
        let stored = payload.to_value();

        let restored = ChangePayload::from_value(&AuditEventType::FieldChanged, stored);
        assert!(matches!(restored, Ok(ref p) if p == &payload));
    }

    #[test]
    fn custom_event_names_use_their_own_storage_value() {
        let event = AuditEventType::custom("ADDED_EMAIL").unwrap_or_else(|_| unreachable!());
        assert_eq!(event.as_str(), "ADDED_EMAIL");

        let parsed = AuditEventType::parse("ADDED_EMAIL");
        assert!(matches!(parsed, Ok(ref e) if e == &event));
    }

    #[test]
    fn known_storage_values_parse_to_lifecycle_events() {
        assert!(matches!(
            AuditEventType::parse("created"),
            Ok(AuditEventType::Created)
        ));
        assert!(matches!(
            AuditEventType::parse("field_changed"),
            Ok(AuditEventType::FieldChanged)
        ));
    }
}
