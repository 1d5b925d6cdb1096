//! Route definitions for collection versioning settings.

use axum::routing::get;
use axum::Router;

use crate::handlers::collections;
use crate::state::AppState;

/// Routes mounted at `/collections`.
///
/// ```text
/// GET    /{collection}    get_collection
/// PUT    /{collection}    upsert_collection (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{collection}",
        get(collections::get_collection).put(collections::upsert_collection),
    )
}
