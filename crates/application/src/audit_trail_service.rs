use std::sync::Arc;

use papertrail_core::{ActorIdentity, AppResult};

use crate::audit_ports::{ActorProvider, AuditSubject, AuditTrailRepository};
use crate::change_detector::{ChangeDetector, TextEqualityPolicy};
use crate::message_renderer::MessageRenderer;

mod custom;
mod lifecycle;

/// Configuration injected into the recorder at construction.
///
/// Read once per operation entry; there are no ambient global switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditConfig {
    /// Disables every recorder operation globally.
    pub suppress_all: bool,
    /// Equality policy for text fields during change detection.
    pub text_equality: TextEqualityPolicy,
}

/// Application service turning lifecycle events into persisted audit records.
#[derive(Clone)]
pub struct AuditTrailService {
    repository: Arc<dyn AuditTrailRepository>,
    actor_provider: Arc<dyn ActorProvider>,
    renderer: MessageRenderer,
    detector: ChangeDetector,
    config: AuditConfig,
}

impl AuditTrailService {
    /// Creates a recorder from its collaborator ports and configuration.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuditTrailRepository>,
        actor_provider: Arc<dyn ActorProvider>,
        renderer: MessageRenderer,
        config: AuditConfig,
    ) -> Self {
        Self {
            repository,
            actor_provider,
            renderer,
            detector: ChangeDetector::new(config.text_equality),
            config,
        }
    }

    /// Returns the renderer used for precomputing messages.
    #[must_use]
    pub fn renderer(&self) -> &MessageRenderer {
        &self.renderer
    }

    fn suppressed(&self, subject: &dyn AuditSubject) -> bool {
        self.config.suppress_all || subject.no_audit()
    }

    async fn current_actor(&self) -> AppResult<Option<ActorIdentity>> {
        self.actor_provider.current_actor().await
    }
}
