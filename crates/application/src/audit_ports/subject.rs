use std::collections::{BTreeMap, BTreeSet};

use papertrail_core::{AppError, AppResult, NonEmptyString};
use papertrail_domain::EntitySchema;
use serde_json::{Map, Value};

/// Capability view of a tracked record handed to the audit layer.
///
/// The integrating entity composes this capability instead of inheriting
/// audit state: it exposes its schema, identity and current values, plus its
/// per-entity audit options.
pub trait AuditSubject: Send + Sync {
    /// Returns the subject's entity schema.
    fn schema(&self) -> &EntitySchema;

    /// Returns the subject record's identifier.
    fn subject_id(&self) -> &str;

    /// Returns the current value of a field, if set.
    fn value_of(&self, field_name: &str) -> Option<&Value>;

    /// Returns whether the field is on the subject's explicit audit skip-list.
    fn skip_field_from_audit(&self, field_name: &str) -> bool;

    /// Returns whether auditing is disabled for this subject entirely.
    fn no_audit(&self) -> bool;
}

/// Map of field name to prior value, captured immediately before a write.
///
/// The integration contract is two explicit phases: capture the snapshot of
/// the about-to-change fields before the write, then hand it to the recorder
/// after the write succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySnapshot {
    values: BTreeMap<String, Value>,
}

impl DirtySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the subject's current values for the named fields.
    #[must_use]
    pub fn capture(subject: &dyn AuditSubject, field_names: &[&str]) -> Self {
        let mut snapshot = Self::new();
        for field_name in field_names {
            let value = subject
                .value_of(field_name)
                .cloned()
                .unwrap_or(Value::Null);
            snapshot.insert((*field_name).to_owned(), value);
        }
        snapshot
    }

    /// Records the prior value of one field.
    pub fn insert(&mut self, field_name: impl Into<String>, prior_value: Value) {
        self.values.insert(field_name.into(), prior_value);
    }

    /// Iterates over field name and prior value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(field_name, value)| (field_name.as_str(), value))
    }

    /// Iterates over snapshotted field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns whether the snapshot holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of snapshotted fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<(String, Value)> for DirtySnapshot {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A schema plus current record data composed into an [`AuditSubject`].
#[derive(Debug, Clone)]
pub struct TrackedRecord {
    schema: EntitySchema,
    subject_id: NonEmptyString,
    data: Map<String, Value>,
    skip_fields: BTreeSet<String>,
    no_audit: bool,
}

impl TrackedRecord {
    /// Creates a tracked record view from a schema, record id and JSON object.
    pub fn new(
        schema: EntitySchema,
        subject_id: impl Into<String>,
        data: Value,
    ) -> AppResult<Self> {
        let Value::Object(data) = data else {
            return Err(AppError::Validation(
                "tracked record data must be a JSON object".to_owned(),
            ));
        };

        Ok(Self {
            schema,
            subject_id: NonEmptyString::new(subject_id)?,
            data,
            skip_fields: BTreeSet::new(),
            no_audit: false,
        })
    }

    /// Adds field names to the explicit audit skip-list.
    #[must_use]
    pub fn with_skip_fields(mut self, field_names: impl IntoIterator<Item = String>) -> Self {
        self.skip_fields.extend(field_names);
        self
    }

    /// Disables auditing for this record entirely.
    #[must_use]
    pub fn with_no_audit(mut self, no_audit: bool) -> Self {
        self.no_audit = no_audit;
        self
    }

    /// Sets the current value of a field.
    pub fn set_value(&mut self, field_name: impl Into<String>, value: Value) {
        self.data.insert(field_name.into(), value);
    }
}

impl AuditSubject for TrackedRecord {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn subject_id(&self) -> &str {
        self.subject_id.as_str()
    }

    fn value_of(&self, field_name: &str) -> Option<&Value> {
        self.data.get(field_name)
    }

    fn skip_field_from_audit(&self, field_name: &str) -> bool {
        self.skip_fields.contains(field_name)
    }

    fn no_audit(&self) -> bool {
        self.no_audit
    }
}

#[cfg(test)]
mod tests {
    use papertrail_domain::{EntityDefinition, EntityFieldDefinition, EntitySchema, FieldType};
    use serde_json::json;

    use super::{AuditSubject, DirtySnapshot, TrackedRecord};

    fn schema() -> EntitySchema {
        let entity = EntityDefinition::new("contact", "Contact").unwrap_or_else(|_| unreachable!());
        let name = EntityFieldDefinition::new(
            "contact",
            "name",
            "Name",
            FieldType::Text,
            false,
            false,
            None,
            None,
        )
        .unwrap_or_else(|_| unreachable!());
        EntitySchema::new(entity, vec![name]).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn tracked_record_requires_object_payload() {
        let result = TrackedRecord::new(schema(), "1", json!("not-object"));
        assert!(result.is_err());
    }

    #[test]
    fn capture_snapshots_current_values() {
        let record = TrackedRecord::new(schema(), "1", json!({"name": "old"}))
            .unwrap_or_else(|_| unreachable!());

        let snapshot = DirtySnapshot::capture(&record, &["name", "missing"]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.iter().collect::<Vec<_>>(),
            vec![("missing", &json!(null)), ("name", &json!("old"))]
        );
    }

    #[test]
    fn skip_fields_and_no_audit_are_exposed() {
        let record = TrackedRecord::new(schema(), "1", json!({}))
            .unwrap_or_else(|_| unreachable!())
            .with_skip_fields(["name".to_owned()])
            .with_no_audit(true);

        assert!(record.skip_field_from_audit("name"));
        assert!(!record.skip_field_from_audit("other"));
        assert!(record.no_audit());
    }
}
