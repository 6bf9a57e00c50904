//! The remote store host behind `recetario-server`.

pub mod api;
pub mod storage;
pub mod users;

pub use api::{router, AppState};
pub use storage::{ServerStorage, ServerStorageError};
pub use users::{generate_api_key, hash_api_key, UserStore, UserStoreError};
