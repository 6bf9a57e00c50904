use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{RecipeDocument, RemoteError, RemoteStore, StoredRecipe};
use crate::models::User;

/// Client for a `recetario-server` instance, authenticated with an API key.
pub struct HttpRemoteStore {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("recetario/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps non-success responses onto [`RemoteError`].
    async fn check(response: Response, what: &str) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(RemoteError::NotAuthenticated),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(what.to_string())),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(RemoteError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn current_user(&self) -> Result<User, RemoteError> {
        let response = self
            .http
            .get(self.url("/me"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = Self::check(response, "user").await?;
        response
            .json::<User>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn add_recipe(&self, doc: &RecipeDocument) -> Result<String, RemoteError> {
        let response = self
            .http
            .post(self.url("/recipes"))
            .bearer_auth(&self.api_key)
            .json(doc)
            .send()
            .await?;
        let response = Self::check(response, "recipes").await?;
        let created: CreatedResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        tracing::debug!(id = %created.id, "Recipe added remotely");
        Ok(created.id)
    }

    async fn set_recipe(&self, external_id: &str, doc: &RecipeDocument) -> Result<(), RemoteError> {
        let path = format!("/recipes/{}", urlencoding::encode(external_id));
        let response = self
            .http
            .put(self.url(&path))
            .bearer_auth(&self.api_key)
            .json(doc)
            .send()
            .await?;
        Self::check(response, external_id).await?;
        Ok(())
    }

    async fn delete_recipe(&self, external_id: &str) -> Result<(), RemoteError> {
        let path = format!("/recipes/{}", urlencoding::encode(external_id));
        let response = self
            .http
            .delete(self.url(&path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::check(response, external_id).await?;
        Ok(())
    }

    async fn recipes_for_owner(&self, owner_id: &str) -> Result<Vec<StoredRecipe>, RemoteError> {
        let response = self
            .http
            .get(self.url("/recipes"))
            .query(&[("owner", owner_id)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = Self::check(response, "recipes").await?;
        response
            .json::<Vec<StoredRecipe>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}
