use std::collections::BTreeSet;

use crate::metadata::{EntitySchema, FieldType};

/// Granularity used when formatting a temporal field at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalGranularity {
    /// Time of day only.
    Time,
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
}

/// Audit treatment decided for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Field is never audited.
    Skip,
    /// A change is recorded, but values are never stored.
    NoValue,
    /// Old/new stored and rendered as plain values.
    Scalar,
    /// Old/new stored as absolute timestamps, truncated at render time.
    Temporal(TemporalGranularity),
    /// Old/new stored as raw keys, resolved through the option set at render time.
    Enumerated,
    /// Old/new stored as foreign-key ids, resolved to titles at render time.
    Reference,
}

/// Decides the audit treatment of a field from its metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeClassifier;

impl ChangeClassifier {
    /// Classifies a field by name against a schema and an explicit exclusion set.
    ///
    /// The decision order matters: reference and enumerated checks run before
    /// the temporal and scalar fallthrough, because a reference field may
    /// share a scalar storage type.
    #[must_use]
    pub fn classify(
        schema: &EntitySchema,
        field_name: &str,
        excluded_fields: &BTreeSet<String>,
    ) -> Classification {
        let Some(field) = schema.field(field_name) else {
            return Classification::Skip;
        };

        if field.is_identifier() || field.never_persist() {
            return Classification::Skip;
        }

        if excluded_fields.contains(field_name) {
            return Classification::Skip;
        }

        if field.field_type() == FieldType::Secret {
            return Classification::NoValue;
        }

        if field.field_type() == FieldType::Relation {
            return Classification::Reference;
        }

        if field.option_set().is_some() {
            return Classification::Enumerated;
        }

        match field.field_type() {
            FieldType::Time => Classification::Temporal(TemporalGranularity::Time),
            FieldType::Date => Classification::Temporal(TemporalGranularity::Date),
            FieldType::DateTime => Classification::Temporal(TemporalGranularity::DateTime),
            _ => Classification::Scalar,
        }
    }
}
