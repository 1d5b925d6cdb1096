//! Route definitions for content versions and the review workflow.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Routes mounted at `/versions`.
///
/// ```text
/// GET    /                        list_versions (?collection=&item=)
/// POST   /                        create_version
/// GET    /{id}                    get_version
/// DELETE /{id}                    delete_version
/// PATCH  /{id}/delta              save_delta
/// POST   /{id}/request-review     request_version_review
/// POST   /{id}/approve            approve_version (reviewer)
/// POST   /{id}/reject             reject_version (reviewer)
/// GET    /{id}/approval-state     get_approval_state
/// POST   /{id}/promote            promote_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(versions::list_versions).post(versions::create_version),
        )
        .route(
            "/{id}",
            get(versions::get_version).delete(versions::delete_version),
        )
        .route("/{id}/delta", patch(versions::save_delta))
        .route(
            "/{id}/request-review",
            post(versions::request_version_review),
        )
        .route("/{id}/approve", post(versions::approve_version))
        .route("/{id}/reject", post(versions::reject_version))
        .route("/{id}/approval-state", get(versions::get_approval_state))
        .route("/{id}/promote", post(versions::promote_version))
}
