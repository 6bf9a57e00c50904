//! Recetario remote store server
//!
//! Stores each user's recipe documents as JSON files and serves them to the
//! `recetario` CLI.
//!
//! # Configuration
//!
//! Environment variables:
//! - `RECETARIO_PORT`: Port to listen on (default: 8080)
//! - `RECETARIO_SERVER_DATA_DIR`: Directory for users and documents
//!   (default: ~/.local/share/recetario-server)
//!
//! Users are managed with `recetario-admin`.

use recetario::server::{router, AppState, ServerStorage, UserStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    port: u16,
    data_dir: PathBuf,
}

impl Config {
    fn from_env() -> Self {
        let port = std::env::var("RECETARIO_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("RECETARIO_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        Self { port, data_dir }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recetario-server")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recetario=info,recetario_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Data directory: {}", config.data_dir.display());

    let users = UserStore::load(&config.data_dir);
    if users.is_empty() {
        tracing::warn!("No users registered - all authenticated requests will fail");
    }

    let state = AppState::new(users, ServerStorage::new(&config.data_dir));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
