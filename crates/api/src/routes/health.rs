use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Newest applied schema migration, `null` when unknown.
    pub schema_version: Option<i64>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = versionflow_db::health_check(&state.pool).await.is_ok();
    let schema_version = if db_healthy {
        versionflow_db::latest_migration(&state.pool)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Could not read migration history");
                None
            })
    } else {
        None
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version,
    })
}

/// Health routes, mounted at the root rather than under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
