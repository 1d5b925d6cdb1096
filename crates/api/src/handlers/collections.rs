//! Handlers for collection-level versioning settings.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use versionflow_core::error::CoreError;
use versionflow_db::models::collection::UpsertCollection;
use versionflow_db::repositories::CollectionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/collections/{collection}
pub async fn get_collection(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> AppResult<impl IntoResponse> {
    let settings = CollectionRepo::find(&state.pool, &collection)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Collection",
                id: collection.clone(),
            })
        })?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/collections/{collection}
///
/// Create or patch the versioning settings of a collection. Admin only.
pub async fn upsert_collection(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(input): Json<UpsertCollection>,
) -> AppResult<impl IntoResponse> {
    if collection.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Collection name must not be empty".into(),
        ));
    }

    let settings = CollectionRepo::upsert(&state.pool, &collection, &input).await?;

    tracing::info!(
        user_id = %admin.user_id,
        collection = %settings.collection,
        versioning = settings.versioning,
        versioning_restrictions = settings.versioning_restrictions,
        "Collection settings updated"
    );

    Ok(Json(DataResponse { data: settings }))
}
