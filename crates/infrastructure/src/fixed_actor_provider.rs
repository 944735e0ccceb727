use async_trait::async_trait;
use papertrail_application::ActorProvider;
use papertrail_core::{ActorIdentity, AppResult};

/// Actor provider returning a constant, possibly absent actor.
///
/// Useful for system and background processes where no user session exists.
#[derive(Debug, Clone, Default)]
pub struct FixedActorProvider {
    actor: Option<ActorIdentity>,
}

impl FixedActorProvider {
    /// Creates a provider that always returns the given actor.
    #[must_use]
    pub fn new(actor: Option<ActorIdentity>) -> Self {
        Self { actor }
    }
}

#[async_trait]
impl ActorProvider for FixedActorProvider {
    async fn current_actor(&self) -> AppResult<Option<ActorIdentity>> {
        Ok(self.actor.clone())
    }
}
