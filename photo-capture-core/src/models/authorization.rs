use serde::{Deserialize, Serialize};

/// Camera consent state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    Denied,
    /// Access is blocked by policy (parental controls, MDM); the user cannot grant it.
    Restricted,
    Authorized,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Whether asking the user could still change the outcome.
    pub fn can_request(&self) -> bool {
        matches!(self, Self::NotDetermined)
    }
}
