//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod audit_trail_service;
mod change_detector;
mod message_renderer;

pub use audit_ports::{
    ActorProvider, AuditSubject, AuditTrailRepository, DirtySnapshot, LinkChange, LinkEventKind,
    ReferenceTitle, ReferenceTitleResolver, SatelliteChange, SatelliteEventKind, TrackedRecord,
};
pub use audit_trail_service::{AuditConfig, AuditTrailService};
pub use change_detector::{ChangeDetector, DetectedChange, TextEqualityPolicy};
pub use message_renderer::{MessageRenderer, MessageTemplates, TemporalFormats};
