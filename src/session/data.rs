use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session key holding the verified Persona email
pub const EMAIL_KEY: &str = "email";
/// Session key holding the user's username once known
pub const USERNAME_KEY: &str = "username";
/// Session key holding the CSRF token
pub const CSRF_KEY: &str = "_csrf";

/// Per-browser session state carried in the encrypted session cookie
///
/// A plain key/value map plus the creation time used for expiry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LoginSession {
    #[serde(default)]
    values: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
}

impl Default for LoginSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Remove a key, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get(EMAIL_KEY)
    }

    pub fn set_email(&mut self, email: &str) {
        self.insert(EMAIL_KEY, email);
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME_KEY)
    }

    /// Drop the identity fields (`username`, `email`); other keys are kept
    ///
    /// Returns whether anything was removed.
    pub fn clear_identity(&mut self) -> bool {
        let removed_username = self.remove(USERNAME_KEY).is_some();
        let removed_email = self.remove(EMAIL_KEY).is_some();
        removed_username || removed_email
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the session has outlived `max_age` at `now`
    ///
    /// A deadline past the representable range never expires.
    #[must_use]
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.created_at
            .checked_add_signed(max_age)
            .is_some_and(|deadline| deadline <= now)
    }
}
