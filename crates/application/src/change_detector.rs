use std::collections::BTreeSet;

use papertrail_domain::{ChangeClassifier, Classification, FieldType};
use serde_json::Value;

use crate::audit_ports::{AuditSubject, DirtySnapshot};

/// Equality policy applied to text fields during change detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEqualityPolicy {
    /// Any non-strictly-equal pair is a change.
    #[default]
    Strict,
    /// `null` and the empty string are treated as equal for text fields,
    /// suppressing audit noise from round-tripped empty inputs.
    NullEqualsEmpty,
}

/// One audit-worthy field change surviving detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedChange {
    /// Logical name of the changed field.
    pub field_name: String,
    /// Classification decided for the field.
    pub classification: Classification,
    /// Declared type of the field.
    pub field_type: FieldType,
    /// Prior value from the dirty snapshot.
    pub old_value: Value,
    /// Current value on the subject.
    pub new_value: Value,
}

/// Decides, per snapshotted field, whether a real change occurred.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    text_equality: TextEqualityPolicy,
}

impl ChangeDetector {
    /// Creates a detector with the given text equality policy.
    #[must_use]
    pub fn new(text_equality: TextEqualityPolicy) -> Self {
        Self { text_equality }
    }

    /// Compares a dirty snapshot against the subject's current values.
    ///
    /// Fields classified as skip are dropped, strictly equal pairs are
    /// dropped, and the remaining fields are emitted tagged with their
    /// classification.
    #[must_use]
    pub fn detect(
        &self,
        subject: &dyn AuditSubject,
        snapshot: &DirtySnapshot,
    ) -> Vec<DetectedChange> {
        let schema = subject.schema();
        let excluded: BTreeSet<String> = snapshot
            .field_names()
            .filter(|field_name| subject.skip_field_from_audit(field_name))
            .map(str::to_owned)
            .collect();

        let mut changes = Vec::new();
        for (field_name, prior_value) in snapshot.iter() {
            let classification = ChangeClassifier::classify(schema, field_name, &excluded);
            if classification == Classification::Skip {
                continue;
            }

            let Some(field) = schema.field(field_name) else {
                continue;
            };

            let current_value = subject
                .value_of(field_name)
                .cloned()
                .unwrap_or(Value::Null);

            if *prior_value == current_value {
                continue;
            }

            if self.text_equality == TextEqualityPolicy::NullEqualsEmpty
                && field.field_type() == FieldType::Text
                && is_blank(prior_value)
                && is_blank(&current_value)
            {
                continue;
            }

            changes.push(DetectedChange {
                field_name: field_name.to_owned(),
                classification,
                field_type: field.field_type(),
                old_value: prior_value.clone(),
                new_value: current_value,
            });
        }

        changes
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use papertrail_domain::{
        Classification, EntityDefinition, EntityFieldDefinition, EntitySchema, FieldType,
    };
    use serde_json::json;

    use crate::audit_ports::{DirtySnapshot, TrackedRecord};

    use super::{ChangeDetector, TextEqualityPolicy};

    fn schema() -> EntitySchema {
        let entity = EntityDefinition::new("contact", "Contact").unwrap_or_else(|_| unreachable!());
        let fields = vec![
            EntityFieldDefinition::new(
                "contact", "id", "Id", FieldType::Number, true, false, None, None,
            )
            .unwrap_or_else(|_| unreachable!()),
            EntityFieldDefinition::new(
                "contact", "name", "Name", FieldType::Text, false, false, None, None,
            )
            .unwrap_or_else(|_| unreachable!()),
            EntityFieldDefinition::new(
                "contact", "age", "Age", FieldType::Number, false, false, None, None,
            )
            .unwrap_or_else(|_| unreachable!()),
        ];
        EntitySchema::new(entity, fields).unwrap_or_else(|_| unreachable!())
    }

    fn record(data: serde_json::Value) -> TrackedRecord {
        TrackedRecord::new(schema(), "1", data).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn strictly_equal_values_are_not_changes() {
        let subject = record(json!({"name": "Alice"}));
        let snapshot = DirtySnapshot::from_iter([("name".to_owned(), json!("Alice"))]);

        let changes = ChangeDetector::default().detect(&subject, &snapshot);
        assert!(changes.is_empty());
    }

    #[test]
    fn type_mismatch_is_a_change_under_strict_equality() {
        let subject = record(json!({"age": "42"}));
        let snapshot = DirtySnapshot::from_iter([("age".to_owned(), json!(42))]);

        let changes = ChangeDetector::default().detect(&subject, &snapshot);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].classification, Classification::Scalar);
    }

    #[test]
    fn identifier_and_unknown_fields_are_dropped() {
        let subject = record(json!({"id": 2, "name": "Alice"}));
        let snapshot = DirtySnapshot::from_iter([
            ("id".to_owned(), json!(1)),
            ("ghost".to_owned(), json!("x")),
        ]);

        let changes = ChangeDetector::default().detect(&subject, &snapshot);
        assert!(changes.is_empty());
    }

    #[test]
    fn skip_listed_fields_are_dropped() {
        let subject = record(json!({"name": "Bob"})).with_skip_fields(["name".to_owned()]);
        let snapshot = DirtySnapshot::from_iter([("name".to_owned(), json!("Alice"))]);

        let changes = ChangeDetector::default().detect(&subject, &snapshot);
        assert!(changes.is_empty());
    }

    #[test]
    fn null_to_empty_string_is_suppressed_with_carve_out() {
        let subject = record(json!({"name": ""}));
        let snapshot = DirtySnapshot::from_iter([("name".to_owned(), json!(null))]);

        let detector = ChangeDetector::new(TextEqualityPolicy::NullEqualsEmpty);
        assert!(detector.detect(&subject, &snapshot).is_empty());
    }

    #[test]
    fn null_to_empty_string_is_a_change_without_carve_out() {
        let subject = record(json!({"name": ""}));
        let snapshot = DirtySnapshot::from_iter([("name".to_owned(), json!(null))]);

        let detector = ChangeDetector::new(TextEqualityPolicy::Strict);
        let changes = detector.detect(&subject, &snapshot);
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn carve_out_only_applies_to_text_fields() {
        let subject = record(json!({"age": null}));
        let snapshot = DirtySnapshot::from_iter([("age".to_owned(), json!(0))]);

        let detector = ChangeDetector::new(TextEqualityPolicy::NullEqualsEmpty);
        assert_eq!(detector.detect(&subject, &snapshot).len(), 1);
    }
}
