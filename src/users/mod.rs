//! User lookup collaborator
//!
//! The identity handlers only ever need one operation from the user store:
//! find a user document by email. [`UserStore`] is that seam; the server ships
//! with a JSON-file backed store and tests use the in-memory one.

pub mod file_store;
pub mod memory;

use crate::models::UserRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use file_store::JsonFileUserStore;
pub use memory::InMemoryUserStore;

/// Errors raised by a user store lookup
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user store is unavailable")]
    Unavailable,
    #[error("failed to read user store: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed user store document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Keyed lookup of user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user whose email matches, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be queried. A missing user
    /// is `Ok(None)`, not an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError>;

    /// Whether the store can currently answer lookups
    fn is_available(&self) -> bool {
        true
    }

    /// Short name for logging
    fn store_name(&self) -> &'static str;
}

/// Normalize an email for use as a lookup key
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
