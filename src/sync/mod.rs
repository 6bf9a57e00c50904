//! Mirroring between the local store and the remote store.
//!
//! Writes go to the local store first and are then mirrored remotely; pulls
//! merge the user's remote documents into the local store by external id.

mod auth;
mod pull;
mod service;

pub use auth::AuthService;
pub use pull::{pull, SyncReport};
pub use service::{RecipeService, WriteOutcome};

use thiserror::Error;

use crate::images::ImageError;
use crate::remote::RemoteError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Background write failed: {0}")]
    Task(String),
}
