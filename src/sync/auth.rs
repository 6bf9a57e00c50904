use chrono::Utc;
use std::sync::Arc;

use super::SyncError;
use crate::db::UserRepository;
use crate::models::User;
use crate::remote::{RemoteError, RemoteStore};

/// Session handling on top of the remote store's identity, with the last
/// seen user cached locally for offline use.
#[derive(Clone)]
pub struct AuthService {
    remote: Arc<dyn RemoteStore>,
    users: UserRepository,
}

impl AuthService {
    pub fn new(remote: Arc<dyn RemoteStore>, users: UserRepository) -> Self {
        Self { remote, users }
    }

    /// Confirms the identity with the remote store and caches it.
    pub async fn login(&self) -> Result<User, SyncError> {
        let mut user = self.remote.current_user().await.map_err(|e| match e {
            RemoteError::NotAuthenticated => SyncError::NotAuthenticated,
            other => SyncError::Remote(other),
        })?;
        user.last_seen_at = Utc::now();
        self.users.upsert(&user).await?;
        tracing::info!(uid = %user.uid, "Logged in");
        Ok(user)
    }

    /// The remote identity when reachable; otherwise the most recently seen
    /// cached user. `None` when the remote store rejects the credentials.
    pub async fn current_user(&self) -> Result<Option<User>, SyncError> {
        match self.remote.current_user().await {
            Ok(mut user) => {
                user.last_seen_at = Utc::now();
                self.users.upsert(&user).await?;
                Ok(Some(user))
            }
            Err(RemoteError::NotAuthenticated) => Ok(None),
            Err(e) => {
                tracing::warn!("Remote store unreachable, using cached user: {}", e);
                Ok(self.users.most_recent().await?)
            }
        }
    }

    /// Forgets every cached user.
    pub async fn logout(&self) -> Result<(), SyncError> {
        self.users.delete_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::remote::MemoryRemoteStore;

    async fn setup(remote: MemoryRemoteStore) -> (Arc<MemoryRemoteStore>, AuthService, UserRepository) {
        let users = UserRepository::new(init_memory_db().await.unwrap());
        let remote = Arc::new(remote);
        let auth = AuthService::new(remote.clone(), users.clone());
        (remote, auth, users)
    }

    #[tokio::test]
    async fn test_login_caches_user() {
        let (_remote, auth, users) =
            setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", "ana@example.com"))).await;

        let user = auth.login().await.unwrap();
        assert_eq!(user.uid, "u1");
        assert!(users.get("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_without_credentials() {
        let (_remote, auth, _users) = setup(MemoryRemoteStore::new()).await;
        assert!(matches!(auth.login().await, Err(SyncError::NotAuthenticated)));
        assert!(auth.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_falls_back_to_cached_user() {
        let (remote, auth, _users) =
            setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;
        auth.login().await.unwrap();

        remote.set_offline(true);
        let user = auth.current_user().await.unwrap().unwrap();
        assert_eq!(user.uid, "u1");
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let (remote, auth, _users) =
            setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;
        auth.login().await.unwrap();
        auth.logout().await.unwrap();

        remote.set_offline(true);
        assert!(auth.current_user().await.unwrap().is_none());
    }
}
