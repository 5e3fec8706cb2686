//! Liveness and database readiness

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
///
/// 503 while the database is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (code, status, database) = match state.library().ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    let report = HealthReport {
        status,
        database,
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    (code, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
