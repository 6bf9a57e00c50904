use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use super::{AuthService, SyncError};
use crate::db::{RecipeRepository, WriteExecutor};
use crate::images::ImageStore;
use crate::models::Recipe;
use crate::remote::{RecipeDocument, RemoteError, RemoteStore};

/// Result of a mirrored write. The local write always happened; a failed
/// remote mirror is reported alongside instead of undoing it.
#[derive(Debug)]
pub struct WriteOutcome {
    pub recipe: Recipe,
    pub remote_error: Option<RemoteError>,
}

impl WriteOutcome {
    fn local(recipe: Recipe) -> Self {
        Self {
            recipe,
            remote_error: None,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.remote_error.is_none()
    }
}

/// Recipe writes: local store first, then the remote store.
#[derive(Clone)]
pub struct RecipeService {
    repo: RecipeRepository,
    remote: Arc<dyn RemoteStore>,
    auth: AuthService,
    executor: WriteExecutor,
}

impl RecipeService {
    pub fn new(
        repo: RecipeRepository,
        remote: Arc<dyn RemoteStore>,
        auth: AuthService,
        executor: WriteExecutor,
    ) -> Self {
        Self {
            repo,
            remote,
            auth,
            executor,
        }
    }

    pub fn repository(&self) -> &RecipeRepository {
        &self.repo
    }

    async fn run_local<F, T>(&self, write: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send + 'static,
        T: Send + 'static,
    {
        match self.executor.spawn(write).await {
            Ok(Some(result)) => Ok(result?),
            Ok(None) => Err(SyncError::Task("write executor closed".to_string())),
            Err(e) => Err(SyncError::Task(e.to_string())),
        }
    }

    /// Saves a new recipe for the signed-in user and mirrors it remotely.
    pub async fn create(&self, mut recipe: Recipe) -> Result<WriteOutcome, SyncError> {
        let user = self
            .auth
            .current_user()
            .await?
            .ok_or(SyncError::NotAuthenticated)?;

        let now = Utc::now();
        recipe.owner_id = Some(user.uid);
        recipe.created_at = now;
        recipe.updated_at = now;
        recipe.external_id = None;

        let repo = self.repo.clone();
        let to_insert = recipe.clone();
        recipe.id = self
            .run_local(async move { repo.insert(&to_insert).await })
            .await?;

        let doc = RecipeDocument::from_recipe(&recipe);
        match self.remote.add_recipe(&doc).await {
            Ok(external_id) => {
                let repo = self.repo.clone();
                let id = recipe.id;
                let ext = external_id.clone();
                self.run_local(async move { repo.set_external_id(id, &ext).await })
                    .await?;
                recipe.external_id = Some(external_id);
                Ok(WriteOutcome::local(recipe))
            }
            Err(e) => {
                tracing::warn!(id = recipe.id, "Failed to mirror new recipe: {}", e);
                Ok(WriteOutcome {
                    recipe,
                    remote_error: Some(e),
                })
            }
        }
    }

    /// Stores `source` as the cover image, then creates the recipe. The stored
    /// copy is removed again if the recipe cannot be saved.
    pub async fn create_with_cover(
        &self,
        recipe: Recipe,
        images: &ImageStore,
        source: &Path,
    ) -> Result<WriteOutcome, SyncError> {
        let stored = images.save_file(source)?;
        let recipe = recipe.with_cover_image(stored.to_string_lossy());

        match self.create(recipe).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(remove_err) = images.remove(&stored) {
                    tracing::warn!("Failed to remove unused image {}: {}", stored.display(), remove_err);
                }
                Err(e)
            }
        }
    }

    pub async fn update(&self, mut recipe: Recipe) -> Result<WriteOutcome, SyncError> {
        recipe.updated_at = Utc::now();

        let repo = self.repo.clone();
        let to_update = recipe.clone();
        self.run_local(async move { repo.update(&to_update).await })
            .await?;

        let Some(external_id) = recipe.external_id.clone() else {
            return Ok(WriteOutcome::local(recipe));
        };
        let doc = RecipeDocument::from_recipe(&recipe);
        match self.remote.set_recipe(&external_id, &doc).await {
            Ok(()) => Ok(WriteOutcome::local(recipe)),
            Err(e) => {
                tracing::warn!(id = recipe.id, "Failed to mirror recipe update: {}", e);
                Ok(WriteOutcome {
                    recipe,
                    remote_error: Some(e),
                })
            }
        }
    }

    pub async fn delete(&self, recipe: Recipe) -> Result<WriteOutcome, SyncError> {
        let repo = self.repo.clone();
        let id = recipe.id;
        self.run_local(async move { repo.delete(id).await }).await?;

        let Some(external_id) = recipe.external_id.clone() else {
            return Ok(WriteOutcome::local(recipe));
        };
        match self.remote.delete_recipe(&external_id).await {
            Ok(()) => Ok(WriteOutcome::local(recipe)),
            Err(e) => {
                tracing::warn!(id = recipe.id, "Failed to mirror recipe deletion: {}", e);
                Ok(WriteOutcome {
                    recipe,
                    remote_error: Some(e),
                })
            }
        }
    }

    /// Favorites are a local preference and are not mirrored.
    pub async fn set_favorite(&self, id: i64, favorite: bool) -> Result<(), SyncError> {
        let repo = self.repo.clone();
        self.run_local(async move { repo.set_favorite(id, favorite).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_db, UserRepository};
    use crate::models::{Ingredient, User};
    use crate::remote::MemoryRemoteStore;

    struct TestContext {
        remote: Arc<MemoryRemoteStore>,
        service: RecipeService,
    }

    async fn setup(remote: MemoryRemoteStore) -> TestContext {
        let pool = init_memory_db().await.unwrap();
        let remote = Arc::new(remote);
        let auth = AuthService::new(remote.clone(), UserRepository::new(pool.clone()));
        let service = RecipeService::new(
            RecipeRepository::new(pool),
            remote.clone(),
            auth,
            WriteExecutor::new(),
        );
        TestContext { remote, service }
    }

    fn recipe(name: &str) -> Recipe {
        let mut recipe =
            Recipe::new(name, "").with_ingredients(vec![Ingredient::new("flour", "500g")]);
        recipe.add_step("Knead the dough");
        recipe
    }

    #[tokio::test]
    async fn test_create_requires_authentication() {
        let ctx = setup(MemoryRemoteStore::new()).await;
        let result = ctx.service.create(recipe("Bread")).await;
        assert!(matches!(result, Err(SyncError::NotAuthenticated)));
        assert_eq!(ctx.service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_mirrors_and_stores_external_id() {
        let ctx = setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;

        let outcome = ctx.service.create(recipe("Bread")).await.unwrap();
        assert!(outcome.is_mirrored());
        let external_id = outcome.recipe.external_id.clone().unwrap();

        let local = ctx
            .service
            .repository()
            .get_by_id(outcome.recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(local.external_id.as_deref(), Some(external_id.as_str()));
        assert_eq!(local.owner_id.as_deref(), Some("u1"));

        let remote_doc = ctx.remote.document(&external_id).await.unwrap();
        assert_eq!(remote_doc.string("name"), "Bread");
    }

    #[tokio::test]
    async fn test_create_keeps_local_row_when_mirror_fails() {
        let ctx = setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;
        // Cache the user so the offline fallback has an identity.
        ctx.service.auth.login().await.unwrap();
        ctx.remote.set_offline(true);

        let outcome = ctx.service.create(recipe("Bread")).await.unwrap();
        assert!(!outcome.is_mirrored());
        assert!(outcome.recipe.external_id.is_none());
        assert_eq!(ctx.service.repository().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_mirrored() {
        let ctx = setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;
        let created = ctx.service.create(recipe("Bread")).await.unwrap().recipe;
        let external_id = created.external_id.clone().unwrap();

        let mut edited = created.clone();
        edited.name = "Rye bread".to_string();
        let updated = ctx.service.update(edited).await.unwrap();
        assert!(updated.is_mirrored());
        assert!(updated.recipe.updated_at >= created.updated_at);
        assert_eq!(
            ctx.remote.document(&external_id).await.unwrap().string("name"),
            "Rye bread"
        );

        let deleted = ctx.service.delete(updated.recipe).await.unwrap();
        assert!(deleted.is_mirrored());
        assert!(ctx.remote.document(&external_id).await.is_none());
        assert_eq!(ctx.service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_favorite_is_local_only() {
        let ctx = setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;
        let created = ctx.service.create(recipe("Bread")).await.unwrap().recipe;
        let external_id = created.external_id.clone().unwrap();

        ctx.service.set_favorite(created.id, true).await.unwrap();

        let local = ctx.service.repository().get_by_id(created.id).await.unwrap().unwrap();
        assert!(local.favorite);
        assert!(!ctx.remote.document(&external_id).await.unwrap().boolean("favorite"));
    }

    fn write_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("cover.png");
        image::RgbImage::new(16, 16).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_with_cover_stores_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let images = ImageStore::new(dir.path().join("images"));
        let source = write_png(dir.path());
        let ctx = setup(MemoryRemoteStore::signed_in(User::new("u1", "Ana", ""))).await;

        let outcome = ctx
            .service
            .create_with_cover(recipe("Bread"), &images, &source)
            .await
            .unwrap();

        let cover = outcome.recipe.cover_image.unwrap();
        assert!(Path::new(&cover).exists());
        assert!(cover.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_create_with_cover_removes_image_when_create_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let images = ImageStore::new(dir.path().join("images"));
        let source = write_png(dir.path());
        let ctx = setup(MemoryRemoteStore::new()).await;

        let result = ctx
            .service
            .create_with_cover(recipe("Bread"), &images, &source)
            .await;

        assert!(matches!(result, Err(SyncError::NotAuthenticated)));
        assert_eq!(std::fs::read_dir(images.dir()).unwrap().count(), 0);
        assert_eq!(ctx.service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_favorite_survives_pull() {
        let user = User::new("u1", "Ana", "");
        let ctx = setup(MemoryRemoteStore::signed_in(user.clone())).await;
        let created = ctx.service.create(recipe("Bread")).await.unwrap().recipe;
        ctx.service.set_favorite(created.id, true).await.unwrap();

        let report = crate::sync::pull(ctx.remote.as_ref(), ctx.service.repository(), &user)
            .await
            .unwrap();
        assert_eq!(report.updated, 1);

        let local = ctx.service.repository().get_by_id(created.id).await.unwrap().unwrap();
        assert!(local.favorite);
    }
}
