//! Server-side recipe document storage.
//!
//! One JSON file per document, grouped by owner:
//! ```text
//! <DATA_DIR>/
//!   <uid>/
//!     recipes/
//!       <id>.json
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::remote::{RecipeDocument, StoredRecipe};

const RECIPES_DIR: &str = "recipes";
const EXTENSION: &str = "json";

#[derive(Error, Debug)]
pub enum ServerStorageError {
    #[error("I/O error for {}: {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("Failed to decode document {}: {1}", .0.display())]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone)]
pub struct ServerStorage {
    data_dir: PathBuf,
}

impl ServerStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Rejects ids that could escape their directory.
    fn validate_id(id: &str) -> Result<(), ServerStorageError> {
        if id.is_empty()
            || id.contains('/')
            || id.contains('\\')
            || id.contains("..")
            || id.starts_with('.')
        {
            return Err(ServerStorageError::InvalidId(id.to_string()));
        }
        Ok(())
    }

    fn recipes_dir(&self, uid: &str) -> PathBuf {
        self.data_dir.join(uid).join(RECIPES_DIR)
    }

    fn doc_path(&self, uid: &str, id: &str) -> PathBuf {
        self.recipes_dir(uid).join(format!("{}.{}", id, EXTENSION))
    }

    /// Every document owned by `uid`, sorted by id.
    pub fn list(&self, uid: &str) -> Result<Vec<StoredRecipe>, ServerStorageError> {
        Self::validate_id(uid)?;
        let dir = self.recipes_dir(uid);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServerStorageError::Io(dir, e)),
        };

        let mut recipes = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ServerStorageError::Io(dir.clone(), e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let id = id.to_string();
            if let Some(data) = self.load(uid, &id)? {
                recipes.push(StoredRecipe { id, data });
            }
        }
        recipes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(recipes)
    }

    /// Returns `Ok(None)` if the document doesn't exist.
    pub fn load(&self, uid: &str, id: &str) -> Result<Option<RecipeDocument>, ServerStorageError> {
        Self::validate_id(uid)?;
        Self::validate_id(id)?;
        let path = self.doc_path(uid, id);

        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ServerStorageError::Json(path, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerStorageError::Io(path, e)),
        }
    }

    pub fn exists(&self, uid: &str, id: &str) -> Result<bool, ServerStorageError> {
        Self::validate_id(uid)?;
        Self::validate_id(id)?;
        Ok(self.doc_path(uid, id).exists())
    }

    /// Writes a document atomically (temp file + rename).
    pub fn save(&self, uid: &str, id: &str, doc: &RecipeDocument) -> Result<(), ServerStorageError> {
        Self::validate_id(uid)?;
        Self::validate_id(id)?;

        let dir = self.recipes_dir(uid);
        fs::create_dir_all(&dir).map_err(|e| ServerStorageError::Io(dir.clone(), e))?;

        let path = self.doc_path(uid, id);
        let bytes = serde_json::to_vec_pretty(doc).map_err(|e| ServerStorageError::Json(path.clone(), e))?;
        let temp_path = path.with_extension("json.tmp");

        let mut file =
            File::create(&temp_path).map_err(|e| ServerStorageError::Io(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| ServerStorageError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| ServerStorageError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| ServerStorageError::Io(path, e))?;
        Ok(())
    }

    /// Returns false if there was nothing to delete.
    pub fn delete(&self, uid: &str, id: &str) -> Result<bool, ServerStorageError> {
        Self::validate_id(uid)?;
        Self::validate_id(id)?;
        let path = self.doc_path(uid, id);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerStorageError::Io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (ServerStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = ServerStorage::new(temp_dir.path());
        (storage, temp_dir)
    }

    fn doc(name: &str) -> RecipeDocument {
        let mut map = serde_json::Map::new();
        map.insert("name".to_string(), json!(name));
        RecipeDocument(map)
    }

    #[test]
    fn test_load_missing_returns_none() {
        let (storage, _dir) = setup();
        assert!(storage.load("alice", "r1").unwrap().is_none());
        assert!(storage.list("alice").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let (storage, dir) = setup();
        storage.save("alice", "r1", &doc("Paella")).unwrap();

        assert!(dir.path().join("alice/recipes/r1.json").exists());
        assert!(!dir.path().join("alice/recipes/r1.json.tmp").exists());
        assert_eq!(storage.load("alice", "r1").unwrap(), Some(doc("Paella")));
        assert!(storage.exists("alice", "r1").unwrap());
    }

    #[test]
    fn test_list_is_per_owner() {
        let (storage, _dir) = setup();
        storage.save("alice", "b", &doc("B")).unwrap();
        storage.save("alice", "a", &doc("A")).unwrap();
        storage.save("bob", "c", &doc("C")).unwrap();

        let ids: Vec<_> = storage
            .list("alice")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_delete() {
        let (storage, _dir) = setup();
        storage.save("alice", "r1", &doc("X")).unwrap();
        assert!(storage.delete("alice", "r1").unwrap());
        assert!(!storage.delete("alice", "r1").unwrap());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let (storage, _dir) = setup();
        for bad in ["", "../etc", "a/b", "a\\b", ".hidden"] {
            assert!(matches!(
                storage.save("alice", bad, &doc("X")),
                Err(ServerStorageError::InvalidId(_))
            ));
            assert!(matches!(
                storage.list(bad),
                Err(ServerStorageError::InvalidId(_))
            ));
        }
    }

    #[test]
    fn test_corrupt_document_is_error() {
        let (storage, dir) = setup();
        let recipes = dir.path().join("alice/recipes");
        std::fs::create_dir_all(&recipes).unwrap();
        std::fs::write(recipes.join("bad.json"), b"not json").unwrap();

        assert!(matches!(
            storage.load("alice", "bad"),
            Err(ServerStorageError::Json(_, _))
        ));
    }
}
