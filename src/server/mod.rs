//! HTTP API serving the stored characters
//!
//! Two read-only endpoints:
//! - `GET /random/` returns one random character
//! - `GET /characters/` returns a filtered, paginated list

mod error;
mod handlers;
mod state;

pub use error::{AppError, AppResult};
pub use handlers::{list_characters, random_character, CharacterListParams, Paginated};
pub use state::AppState;

use crate::config::Config;
use crate::storage::SqliteStorage;
use crate::SyncError;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub const RANDOM_PATH: &str = "/random/";
pub const CHARACTERS_PATH: &str = "/characters/";

/// Builds the application router with request tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(RANDOM_PATH, get(random_character))
        .route(CHARACTERS_PATH, get(list_characters))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Opens storage and serves the API until Ctrl-C
pub async fn serve(config: &Config) -> Result<(), SyncError> {
    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
    let state = AppState::new(storage, config.server.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
