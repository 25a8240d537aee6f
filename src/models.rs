use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub user_store: bool,
}

/// Identifier of a stored user; documents use either numeric or string ids
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum UserId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A user document as returned by the user store
///
/// Profile fields beyond `id` and `email` are kept verbatim and serialized
/// alongside them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    #[must_use]
    pub fn new(id: UserId, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            profile: Map::new(),
        }
    }

    /// Add a profile field
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(key.to_string(), value.into());
        self
    }

    /// The `username` profile field, if the document has one
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.profile.get("username").and_then(Value::as_str)
    }
}
