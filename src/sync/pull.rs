use serde::Serialize;

use super::SyncError;
use crate::db::{RecipeRepository, UpsertOutcome};
use crate::models::{Recipe, User};
use crate::remote::RemoteStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Fetches every remote recipe owned by `user` and merges them into the local
/// store by external id, in a single transaction.
///
/// A fetch failure leaves the local store untouched. Local recipes whose
/// remote counterpart no longer exists are kept.
pub async fn pull(
    remote: &dyn RemoteStore,
    repo: &RecipeRepository,
    user: &User,
) -> Result<SyncReport, SyncError> {
    let documents = match remote.recipes_for_owner(&user.uid).await {
        Ok(documents) => documents,
        Err(e) => {
            tracing::warn!("Failed to fetch remote recipes: {}", e);
            return Err(e.into());
        }
    };

    let recipes: Vec<Recipe> = documents
        .iter()
        .map(|stored| {
            let mut recipe = stored.data.to_recipe(&stored.id);
            if recipe.owner_id.is_none() {
                recipe.owner_id = Some(user.uid.clone());
            }
            recipe
        })
        .collect();

    let outcomes = repo.upsert_all_by_external_id(&recipes).await?;

    let mut report = SyncReport {
        fetched: documents.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            UpsertOutcome::Inserted(_) => report.inserted += 1,
            UpsertOutcome::Updated(_) => report.updated += 1,
        }
    }

    tracing::info!(
        fetched = report.fetched,
        inserted = report.inserted,
        updated = report.updated,
        "Pulled remote recipes"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::models::Ingredient;
    use crate::remote::{MemoryRemoteStore, RecipeDocument};

    async fn setup() -> (MemoryRemoteStore, RecipeRepository, User) {
        let user = User::new("u1", "Ana", "ana@example.com");
        let remote = MemoryRemoteStore::signed_in(user.clone());
        let repo = RecipeRepository::new(init_memory_db().await.unwrap());
        (remote, repo, user)
    }

    fn document(name: &str, owner: &str) -> RecipeDocument {
        let recipe = Recipe::new(name, "")
            .with_ingredients(vec![Ingredient::new("rice", "300g")]);
        let mut doc = RecipeDocument::from_recipe(&recipe);
        doc.set_owner_id(owner);
        doc
    }

    #[tokio::test]
    async fn test_pull_inserts_only_own_recipes() {
        let (remote, repo, user) = setup().await;
        remote.insert_document("r1", document("Paella", "u1")).await;
        remote.insert_document("r2", document("Risotto", "u1")).await;
        remote.insert_document("r3", document("Not mine", "u2")).await;

        let report = pull(&remote, &repo, &user).await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                fetched: 2,
                inserted: 2,
                updated: 0
            }
        );
        assert_eq!(repo.count().await.unwrap(), 2);
        let paella = repo.get_by_external_id("r1").await.unwrap().unwrap();
        assert_eq!(paella.name, "Paella");
        assert_eq!(paella.owner_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_repeated_pull_does_not_duplicate() {
        let (remote, repo, user) = setup().await;
        remote.insert_document("r1", document("Paella", "u1")).await;

        pull(&remote, &repo, &user).await.unwrap();
        let local_id = repo.get_by_external_id("r1").await.unwrap().unwrap().id;

        remote.insert_document("r1", document("Paella valenciana", "u1")).await;
        let report = pull(&remote, &repo, &user).await.unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
        let merged = repo.get_by_external_id("r1").await.unwrap().unwrap();
        assert_eq!(merged.id, local_id);
        assert_eq!(merged.name, "Paella valenciana");
    }

    #[tokio::test]
    async fn test_pull_keeps_local_favorite() {
        let (remote, repo, user) = setup().await;
        remote.insert_document("r1", document("Paella", "u1")).await;
        pull(&remote, &repo, &user).await.unwrap();

        let local_id = repo.get_by_external_id("r1").await.unwrap().unwrap().id;
        repo.set_favorite(local_id, true).await.unwrap();

        pull(&remote, &repo, &user).await.unwrap();
        assert!(repo.get_by_id(local_id).await.unwrap().unwrap().favorite);
        assert_eq!(repo.favorites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_local_store_untouched() {
        let (remote, repo, user) = setup().await;
        repo.insert(&Recipe::new("Local only", "")).await.unwrap();
        remote.insert_document("r1", document("Paella", "u1")).await;
        remote.set_offline(true);

        assert!(pull(&remote, &repo, &user).await.is_err());
        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Local only"]);
    }

    #[tokio::test]
    async fn test_remote_deletions_are_not_propagated() {
        let (remote, repo, user) = setup().await;
        remote.insert_document("r1", document("Paella", "u1")).await;
        pull(&remote, &repo, &user).await.unwrap();

        remote.delete_recipe("r1").await.unwrap();
        let report = pull(&remote, &repo, &user).await.unwrap();

        assert_eq!(report.fetched, 0);
        assert!(repo.get_by_external_id("r1").await.unwrap().is_some());
    }
}
