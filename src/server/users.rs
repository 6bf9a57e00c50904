//! Registered users of the remote store.
//!
//! Kept in `users.json` in the data directory and managed by
//! `recetario-admin`. API keys are stored as SHA-256 hashes:
//!
//! ```text
//! {
//!   "3f2a...": {
//!     "name": "Ana",
//!     "email": "ana@example.com",
//!     "key_hash": "9b71d2...",
//!     "registered_at": "2025-01-01T00:00:00Z",
//!     "last_seen_at": "2025-01-02T10:00:00Z"
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::User;

pub const USERS_FILE: &str = "users.json";

#[derive(Error, Debug)]
pub enum UserStoreError {
    #[error("I/O error for {}: {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to parse {}: {1}", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("User '{0}' already exists")]
    Duplicate(String),

    #[error("User '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    name: String,
    email: String,
    key_hash: String,
    registered_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_user(&self, uid: &str) -> User {
        User {
            uid: uid.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            registered_at: self.registered_at,
            last_seen_at: self.last_seen_at,
        }
    }
}

/// Generates a random API key: 32 bytes, base64url without padding.
pub fn generate_api_key() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_api_key(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
    users: BTreeMap<String, UserRecord>,
}

impl UserStore {
    /// Loads `users.json` from the data directory.
    ///
    /// A missing or corrupt file yields an empty store.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(USERS_FILE);

        match Self::read(&path) {
            Ok(users) => {
                tracing::info!("Loaded {} user(s)", users.len());
                Self { path, users }
            }
            Err(e) => {
                if matches!(&e, UserStoreError::Io(_, io_err) if io_err.kind() == io::ErrorKind::NotFound)
                {
                    tracing::info!("No {} found, starting with 0 users", USERS_FILE);
                } else {
                    tracing::warn!("Failed to load {}: {}", USERS_FILE, e);
                }
                Self {
                    path,
                    users: BTreeMap::new(),
                }
            }
        }
    }

    /// Like [`UserStore::load`] but fails on a corrupt file, for admin edits.
    pub fn open(data_dir: &Path) -> Result<Self, UserStoreError> {
        let path = data_dir.join(USERS_FILE);
        let users = match Self::read(&path) {
            Ok(users) => users,
            Err(UserStoreError::Io(_, e)) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, users })
    }

    fn read(path: &Path) -> Result<BTreeMap<String, UserRecord>, UserStoreError> {
        let contents =
            fs::read_to_string(path).map_err(|e| UserStoreError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&contents).map_err(|e| UserStoreError::Parse(path.to_path_buf(), e))
    }

    pub fn save(&self) -> Result<(), UserStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| UserStoreError::Io(parent.to_path_buf(), e))?;
        }
        let json = serde_json::to_string_pretty(&self.users)
            .map_err(|e| UserStoreError::Parse(self.path.clone(), e))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|e| UserStoreError::Io(temp_path.clone(), e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| UserStoreError::Io(self.path.clone(), e))
    }

    /// Registers a user and returns it with its API key, which is not stored.
    pub fn add(&mut self, name: &str, email: &str) -> Result<(User, String), UserStoreError> {
        if self.users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(UserStoreError::Duplicate(email.to_string()));
        }

        let uid = uuid::Uuid::new_v4().simple().to_string();
        let key = generate_api_key();
        let now = Utc::now();
        let record = UserRecord {
            name: name.to_string(),
            email: email.to_string(),
            key_hash: hash_api_key(&key),
            registered_at: now,
            last_seen_at: now,
        };
        let user = record.to_user(&uid);
        self.users.insert(uid, record);
        Ok((user, key))
    }

    /// Removes by uid or email.
    pub fn remove(&mut self, uid_or_email: &str) -> Result<User, UserStoreError> {
        let uid = self
            .find_uid(uid_or_email)
            .ok_or_else(|| UserStoreError::NotFound(uid_or_email.to_string()))?;
        let record = self
            .users
            .remove(&uid)
            .ok_or_else(|| UserStoreError::NotFound(uid_or_email.to_string()))?;
        Ok(record.to_user(&uid))
    }

    fn find_uid(&self, uid_or_email: &str) -> Option<String> {
        if self.users.contains_key(uid_or_email) {
            return Some(uid_or_email.to_string());
        }
        self.users
            .iter()
            .find(|(_, u)| u.email.eq_ignore_ascii_case(uid_or_email))
            .map(|(uid, _)| uid.clone())
    }

    /// The user owning `api_key`, if any.
    pub fn authenticate(&self, api_key: &str) -> Option<User> {
        let hash = hash_api_key(api_key);
        self.users
            .iter()
            .find(|(_, u)| u.key_hash == hash)
            .map(|(uid, u)| u.to_user(uid))
    }

    /// Records activity for `uid` and persists it.
    pub fn touch(&mut self, uid: &str) -> Result<User, UserStoreError> {
        let record = self
            .users
            .get_mut(uid)
            .ok_or_else(|| UserStoreError::NotFound(uid.to_string()))?;
        record.last_seen_at = Utc::now();
        let user = record.to_user(uid);
        self.save()?;
        Ok(user)
    }

    pub fn get(&self, uid: &str) -> Option<User> {
        self.users.get(uid).map(|u| u.to_user(uid))
    }

    pub fn list(&self) -> Vec<User> {
        self.users.iter().map(|(uid, u)| u.to_user(uid)).collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
