pub mod collections;
pub mod health;
pub mod versions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /versions                                  list, create
/// /versions/{id}                             get, discard
/// /versions/{id}/delta                       save pending edits (PATCH)
/// /versions/{id}/request-review              request review (POST)
/// /versions/{id}/approve                     approve (reviewer, POST)
/// /versions/{id}/reject                      reject with reason (reviewer, POST)
/// /versions/{id}/approval-state              derived review flags (GET)
/// /versions/{id}/promote                     promote and remove (POST)
///
/// /collections/{collection}                  get, upsert settings (admin PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/versions", versions::router())
        .nest("/collections", collections::router())
}
