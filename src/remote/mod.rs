//! The remote store: a per-user collection of recipe documents.
//!
//! The local store stays the source of what the CLI shows; the remote store
//! mirrors writes and is pulled from during sync.

mod document;
mod http;
mod memory;

pub use document::{RecipeDocument, StoredRecipe};
pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::User;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The authenticated identity.
    async fn current_user(&self) -> Result<User, RemoteError>;

    /// Stores a new document and returns the id the remote store assigned.
    async fn add_recipe(&self, doc: &RecipeDocument) -> Result<String, RemoteError>;

    async fn set_recipe(&self, external_id: &str, doc: &RecipeDocument) -> Result<(), RemoteError>;

    async fn delete_recipe(&self, external_id: &str) -> Result<(), RemoteError>;

    async fn recipes_for_owner(&self, owner_id: &str) -> Result<Vec<StoredRecipe>, RemoteError>;
}
