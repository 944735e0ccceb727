use async_trait::async_trait;
use papertrail_core::{ActorIdentity, AppResult};

/// Port for looking up who is acting right now.
///
/// Returns `None` for system or background processes with no acting user.
#[async_trait]
pub trait ActorProvider: Send + Sync {
    /// Returns the current actor, if any.
    async fn current_actor(&self) -> AppResult<Option<ActorIdentity>>;
}
