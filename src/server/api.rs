//! HTTP surface of the remote store.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `GET /me`: the authenticated user
//! - `GET /recipes?owner=<uid>`: the caller's documents as `[{id, data}]`
//! - `POST /recipes`: stores a new document, returns `{id}`
//! - `PUT /recipes/{id}`: replaces a document
//! - `DELETE /recipes/{id}`: deletes a document

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use super::storage::{ServerStorage, ServerStorageError};
use super::users::UserStore;
use crate::models::User;
use crate::remote::{RecipeDocument, StoredRecipe};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<RwLock<UserStore>>,
    pub storage: ServerStorage,
}

impl AppState {
    pub fn new(users: UserStore, storage: ServerStorage) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
            storage,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Error response carrying a status and a machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn unauthorized(code: &'static str, message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    fn not_found(id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("Recipe '{}' not found", id))
    }
}

impl From<ServerStorageError> for ApiError {
    fn from(e: ServerStorageError) -> Self {
        match e {
            ServerStorageError::InvalidId(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_id", e.to_string())
            }
            _ => {
                tracing::error!("Storage error: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "Storage failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.code,
                message: self.message,
            }),
        )
            .into_response()
    }
}

async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) => h.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::unauthorized("invalid_auth", "Authorization header must use Bearer scheme")
        })?,
        None => {
            return Err(ApiError::unauthorized(
                "missing_auth",
                "Authorization header required",
            ))
        }
    };

    let user = state
        .users
        .read()
        .await
        .authenticate(api_key)
        .ok_or_else(|| ApiError::unauthorized("invalid_key", "Invalid API key"))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<User> {
    match state.users.write().await.touch(&user.uid) {
        Ok(touched) => Json(touched),
        Err(e) => {
            tracing::warn!(uid = %user.uid, "Failed to record last seen: {}", e);
            Json(user)
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    owner: Option<String>,
}

async fn list_recipes(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StoredRecipe>>, ApiError> {
    if let Some(owner) = &query.owner {
        if *owner != user.uid {
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Cannot list another user's recipes",
            ));
        }
    }
    let recipes = state.storage.list(&user.uid)?;
    tracing::debug!(uid = %user.uid, count = recipes.len(), "Listed recipes");
    Ok(Json(recipes))
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

async fn create_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(mut doc): Json<RecipeDocument>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = uuid::Uuid::new_v4().to_string();
    doc.set_owner_id(&user.uid);
    state.storage.save(&user.uid, &id, &doc)?;
    tracing::info!(uid = %user.uid, id = %id, "Recipe created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(mut doc): Json<RecipeDocument>,
) -> Result<StatusCode, ApiError> {
    if !state.storage.exists(&user.uid, &id)? {
        return Err(ApiError::not_found(&id));
    }
    doc.set_owner_id(&user.uid);
    state.storage.save(&user.uid, &id, &doc)?;
    tracing::info!(uid = %user.uid, id = %id, "Recipe updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.storage.delete(&user.uid, &id)? {
        return Err(ApiError::not_found(&id));
    }
    tracing::info!(uid = %user.uid, id = %id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/me", get(me))
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route("/recipes/{id}", axum::routing::put(update_recipe).delete(delete_recipe))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
