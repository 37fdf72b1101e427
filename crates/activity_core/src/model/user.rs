use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

/// Account record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// Assigned on insert; ignored by create.
    #[serde(default)]
    pub id: UserId,
    pub username: String,
    /// Opaque credential, persisted exactly as given. Never serialized out.
    #[serde(skip_serializing)]
    pub password: String,
    /// Epoch milliseconds, assigned by the store on insert and never updated.
    #[serde(default)]
    pub created_at: i64,
}

impl User {
    /// Builds a not-yet-persisted user.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            password: password.into(),
            created_at: 0,
        }
    }
}
