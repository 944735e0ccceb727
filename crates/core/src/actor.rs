use serde::{Deserialize, Serialize};

/// Identity of the user credited with an audited event.
///
/// Captured denormalized at write time: the actor may later be renamed or
/// deleted without invalidating existing audit records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    id: String,
    display_name: String,
}

impl ActorIdentity {
    /// Creates an actor identity from a stable identifier and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns the stable actor identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display name captured for the actor.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
