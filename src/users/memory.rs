use super::{normalize_email, UserStore, UserStoreError};
use crate::models::UserRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// In-memory user store keyed by normalized email
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given users
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    /// Insert or replace a user
    pub fn insert(&self, user: UserRecord) {
        let key = normalize_email(&user.email);
        if let Ok(mut users) = self.users.write() {
            users.insert(key, user);
        }
    }

    /// Toggle availability; an unavailable store fails every lookup
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().map_or(0, |users| users.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        if !self.is_available() {
            return Err(UserStoreError::Unavailable);
        }
        let users = self.users.read().map_err(|_| UserStoreError::Unavailable)?;
        Ok(users.get(&normalize_email(email)).cloned())
    }

    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
