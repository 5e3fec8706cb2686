//! PDF Library Server
//!
//! Stores uploaded and generated PDFs in SQLite, splits them into sections,
//! and serves them back over a small HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod pdf;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().library.max_upload_bytes;

    Router::new()
        .nest("/health", routes::health::router())
        .merge(routes::pdfs::router(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
