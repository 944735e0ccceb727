//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod classification;
mod metadata;

pub use audit::{AuditEventType, AuditRecord, ChangePayload, FieldChange};
pub use classification::{ChangeClassifier, Classification, TemporalGranularity};
pub use metadata::{
    EntityDefinition, EntityFieldDefinition, EntitySchema, FieldType, OptionSet, OptionSetItem,
};
