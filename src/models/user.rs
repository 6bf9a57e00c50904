use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote-store account, cached locally for offline display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Identifier assigned by the remote store.
    pub uid: String,
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl User {
    pub fn new(uid: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            name: name.into(),
            email: email.into(),
            registered_at: now,
            last_seen_at: now,
        }
    }
}
