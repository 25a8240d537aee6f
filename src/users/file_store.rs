use super::{normalize_email, UserStore, UserStoreError};
use crate::models::UserRecord;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// User store backed by a JSON file containing an array of user documents
///
/// The file is read on open and again on [`JsonFileUserStore::reload`].
/// While it cannot be read the store is unavailable, and every availability
/// check or lookup retries the read, so a file that appears later is picked up
/// without a restart.
#[derive(Debug)]
pub struct JsonFileUserStore {
    path: PathBuf,
    users: RwLock<Option<HashMap<String, UserRecord>>>,
}

impl JsonFileUserStore {
    /// Open the store, loading the file if it can be read
    pub fn open(path: impl AsRef<Path>) -> Self {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            users: RwLock::new(None),
        };
        if let Err(e) = store.reload() {
            warn!("User store {} unavailable: {e}", store.path.display());
        }
        store
    }

    /// Re-read the backing file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// user documents. The previously loaded users are discarded in that case.
    pub fn reload(&self) -> Result<usize, UserStoreError> {
        let loaded = Self::read_users(&self.path);
        let mut guard = self.users.write().map_err(|_| UserStoreError::Unavailable)?;
        match loaded {
            Ok(users) => {
                let count = users.len();
                *guard = Some(users);
                info!("Loaded {count} users from {}", self.path.display());
                Ok(count)
            }
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }

    /// Load the file if nothing is loaded yet; returns whether users are loaded
    fn ensure_loaded(&self) -> bool {
        if self.users.read().is_ok_and(|guard| guard.is_some()) {
            return true;
        }
        match self.reload() {
            Ok(_) => true,
            Err(e) => {
                debug!("User store {} still unavailable: {e}", self.path.display());
                false
            }
        }
    }

    fn read_users(path: &Path) -> Result<HashMap<String, UserRecord>, UserStoreError> {
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<UserRecord> = serde_json::from_str(&contents)?;
        Ok(records
            .into_iter()
            .map(|user| (normalize_email(&user.email), user))
            .collect())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserStoreError> {
        self.ensure_loaded();
        let guard = self.users.read().map_err(|_| UserStoreError::Unavailable)?;
        let users = guard.as_ref().ok_or(UserStoreError::Unavailable)?;
        Ok(users.get(&normalize_email(email)).cloned())
    }

    fn is_available(&self) -> bool {
        self.ensure_loaded()
    }

    fn store_name(&self) -> &'static str {
        "json-file"
    }
}
