use async_trait::async_trait;
use std::sync::Arc;

use recetario::config::{Config, RemoteConfig};
use recetario::db::{init_db, RecipeRepository, UserRepository, WriteExecutor};
use recetario::models::User;
use recetario::remote::{HttpRemoteStore, RecipeDocument, RemoteError, RemoteStore, StoredRecipe};
use recetario::sync::{AuthService, RecipeService};

/// Stand-in when no remote store is configured: every call is unauthenticated.
struct Unconfigured;

#[async_trait]
impl RemoteStore for Unconfigured {
    async fn current_user(&self) -> Result<User, RemoteError> {
        Err(RemoteError::NotAuthenticated)
    }

    async fn add_recipe(&self, _doc: &RecipeDocument) -> Result<String, RemoteError> {
        Err(RemoteError::NotAuthenticated)
    }

    async fn set_recipe(&self, _id: &str, _doc: &RecipeDocument) -> Result<(), RemoteError> {
        Err(RemoteError::NotAuthenticated)
    }

    async fn delete_recipe(&self, _id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotAuthenticated)
    }

    async fn recipes_for_owner(&self, _owner: &str) -> Result<Vec<StoredRecipe>, RemoteError> {
        Err(RemoteError::NotAuthenticated)
    }
}

fn build_remote(config: &RemoteConfig) -> Result<Arc<dyn RemoteStore>, RemoteError> {
    match (&config.server_url, &config.api_key) {
        (Some(url), Some(key)) => Ok(Arc::new(HttpRemoteStore::new(url, key)?)),
        _ => Ok(Arc::new(Unconfigured)),
    }
}

/// Everything a command needs, wired from the configuration.
pub struct Context {
    pub config: Config,
    pub remote: Arc<dyn RemoteStore>,
    pub repo: RecipeRepository,
    pub auth: AuthService,
    pub service: RecipeService,
}

impl Context {
    pub async fn open(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = init_db(&config.database_path.value).await?;
        let remote = build_remote(&config.remote)?;

        let repo = RecipeRepository::new(pool.clone());
        let auth = AuthService::new(remote.clone(), UserRepository::new(pool));
        let service = RecipeService::new(
            repo.clone(),
            remote.clone(),
            auth.clone(),
            WriteExecutor::new(),
        );

        Ok(Self {
            config,
            remote,
            repo,
            auth,
            service,
        })
    }

    /// Errors out early with a hint when no remote store is configured.
    pub fn require_remote(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.config.remote.is_configured() {
            Ok(())
        } else {
            Err("Remote store not configured. Set remote.server_url and remote.api_key \
                 (or RECETARIO_SERVER_URL and RECETARIO_API_KEY)"
                .into())
        }
    }
}
