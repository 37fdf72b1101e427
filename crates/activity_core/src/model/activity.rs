use serde::{Deserialize, Serialize};

/// Store-assigned activity identifier.
pub type ActivityId = i64;

/// Activity definition, e.g. "running".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: ActivityId,
    pub name: String,
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}
