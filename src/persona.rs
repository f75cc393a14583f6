//! Personas ("avatars") and the callers that use them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A writing identity injected into the prompt.
///
/// The pipeline only reads personas; storage owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name the model writes as.
    pub name: String,
    /// Short biography.
    pub description: String,
    /// Words the persona likes to use.
    #[serde(default)]
    pub favored_keywords: Option<String>,
    /// Area of expertise.
    #[serde(default)]
    pub domain: Option<String>,
    /// Writing tone.
    #[serde(default)]
    pub tone: Option<String>,
    /// Visible to every caller.
    #[serde(default)]
    pub is_global: bool,
    /// Owning user, if any.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

impl Persona {
    /// Whether `caller` may generate articles with this persona.
    ///
    /// Global personas are readable by everyone, otherwise only by the owner
    /// or a superuser.
    pub fn readable_by(&self, caller: &Caller) -> bool {
        self.is_global || caller.is_superuser || self.owner_id == Some(caller.id)
    }
}

/// Authenticated identity supplied by the host's auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// User id.
    pub id: Uuid,
    /// Superusers can read every persona.
    pub is_superuser: bool,
}

impl Caller {
    /// A regular user.
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            is_superuser: false,
        }
    }
}
