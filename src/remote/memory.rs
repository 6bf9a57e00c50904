use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RecipeDocument, RemoteError, RemoteStore, StoredRecipe};
use crate::models::User;

/// In-process remote store. Useful offline and in tests, where
/// [`MemoryRemoteStore::set_offline`] simulates an unreachable server.
#[derive(Default)]
pub struct MemoryRemoteStore {
    user: Mutex<Option<User>>,
    documents: Mutex<BTreeMap<String, RecipeDocument>>,
    offline: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Mutex::new(Some(user)),
            ..Self::default()
        }
    }

    pub async fn sign_in(&self, user: User) {
        *self.user.lock().await = Some(user);
    }

    pub async fn sign_out(&self) {
        *self.user.lock().await = None;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stores a document under a chosen id, bypassing authentication.
    pub async fn insert_document(&self, id: &str, doc: RecipeDocument) {
        self.documents.lock().await.insert(id.to_string(), doc);
    }

    pub async fn document(&self, id: &str) -> Option<RecipeDocument> {
        self.documents.lock().await.get(id).cloned()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                message: "remote store unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn require_user(&self) -> Result<User, RemoteError> {
        self.ensure_online()?;
        self.user
            .lock()
            .await
            .clone()
            .ok_or(RemoteError::NotAuthenticated)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn current_user(&self) -> Result<User, RemoteError> {
        self.require_user().await
    }

    async fn add_recipe(&self, doc: &RecipeDocument) -> Result<String, RemoteError> {
        let user = self.require_user().await?;
        let id = Uuid::new_v4().to_string();
        let mut doc = doc.clone();
        doc.set_owner_id(&user.uid);
        self.documents.lock().await.insert(id.clone(), doc);
        Ok(id)
    }

    async fn set_recipe(&self, external_id: &str, doc: &RecipeDocument) -> Result<(), RemoteError> {
        let user = self.require_user().await?;
        let mut documents = self.documents.lock().await;
        if !documents.contains_key(external_id) {
            return Err(RemoteError::NotFound(external_id.to_string()));
        }
        let mut doc = doc.clone();
        doc.set_owner_id(&user.uid);
        documents.insert(external_id.to_string(), doc);
        Ok(())
    }

    async fn delete_recipe(&self, external_id: &str) -> Result<(), RemoteError> {
        self.require_user().await?;
        self.documents
            .lock()
            .await
            .remove(external_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(external_id.to_string()))
    }

    async fn recipes_for_owner(&self, owner_id: &str) -> Result<Vec<StoredRecipe>, RemoteError> {
        self.ensure_online()?;
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .filter(|(_, doc)| doc.owner_id().as_deref() == Some(owner_id))
            .map(|(id, doc)| StoredRecipe {
                id: id.clone(),
                data: doc.clone(),
            })
            .collect())
    }
}
