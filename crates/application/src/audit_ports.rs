use serde_json::Value;

mod actor;
mod reference;
mod repository;
mod subject;

pub use actor::ActorProvider;
pub use reference::{ReferenceTitle, ReferenceTitleResolver};
pub use repository::AuditTrailRepository;
pub use subject::{AuditSubject, DirtySnapshot, TrackedRecord};

/// Direction of a many-to-many link event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEventKind {
    /// A link to another record was added.
    Added,
    /// A link to another record was removed.
    Removed,
}

impl LinkEventKind {
    /// Returns a stable label for the link direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "linked",
            Self::Removed => "unlinked",
        }
    }
}

/// Input describing a many-to-many link change on a subject record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChange {
    /// Link direction.
    pub kind: LinkEventKind,
    /// Logical name of the linked entity.
    pub entity_logical_name: String,
    /// Identifier of the linked record.
    pub record_id: String,
    /// Display title of the linked record, captured at event time.
    pub title: String,
}

/// Kind of change observed on a satellite model value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatelliteEventKind {
    /// The satellite record was added.
    Added,
    /// The satellite record's value changed.
    Changed,
    /// The satellite record was removed.
    Removed,
}

impl SatelliteEventKind {
    /// Returns a stable label for the satellite event kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }
}

/// Input describing a change on a satellite model attached to a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatelliteChange {
    /// Satellite event kind.
    pub kind: SatelliteEventKind,
    /// Name of the satellite model (e.g. "email").
    pub model_name: String,
    /// Name of the audited satellite field.
    pub field_name: String,
    /// Prior value of the satellite field.
    pub old_value: Value,
    /// Current value of the satellite field.
    pub new_value: Value,
}
