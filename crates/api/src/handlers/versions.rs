//! Handlers for content versions and their review workflow.
//!
//! Versions are created against items of a collection with versioning
//! enabled, edited by saving deltas, sent through review, and finally either
//! discarded or promoted. Promotion hands the delta back to the caller for
//! merging into the live item and removes the version.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sqlx::PgPool;
use versionflow_core::error::CoreError;
use versionflow_core::types::VersionId;
use versionflow_core::versioning::{
    check_promotable, derive_approval_state, record_decision, request_review,
    validate_version_key, ReviewDecision,
};
use versionflow_db::models::content_version::{
    ContentVersion, CreateContentVersion, PromotedVersion, RejectRequest, SaveDelta,
    VersionListParams,
};
use versionflow_db::repositories::{CollectionRepo, ContentVersionRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireReviewer;
use crate::response::DataResponse;
use crate::state::AppState;

fn version_not_found(id: VersionId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ContentVersion",
        id: id.to_string(),
    })
}

/// Load a version or fail with 404.
async fn ensure_version_exists(pool: &PgPool, id: VersionId) -> AppResult<ContentVersion> {
    ContentVersionRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| version_not_found(id))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/versions
///
/// Save a new named version of an item. The collection must exist and have
/// versioning enabled.
pub async fn create_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateContentVersion>,
) -> AppResult<impl IntoResponse> {
    validate_version_key(&input.key)?;
    if input.item.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Item must not be empty".into(),
        )));
    }
    if let Some(delta) = &input.delta {
        ensure_delta_object(delta)?;
    }

    let settings = CollectionRepo::find(&state.pool, &input.collection)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Collection",
                id: input.collection.clone(),
            })
        })?;
    if !settings.versioning {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Content versioning is not enabled for collection '{}'",
            settings.collection
        ))));
    }

    let version = ContentVersionRepo::create(&state.pool, &input, auth.user_id).await?;

    tracing::info!(
        user_id = %auth.user_id,
        version_id = %version.id,
        collection = %version.collection,
        item = %version.item,
        key = %version.key,
        "Content version created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// GET /api/v1/versions?collection=&item=
pub async fn list_versions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<VersionListParams>,
) -> AppResult<impl IntoResponse> {
    let versions = match &params.item {
        Some(item) => {
            ContentVersionRepo::list_for_item(&state.pool, &params.collection, item).await?
        }
        None => ContentVersionRepo::list_for_collection(&state.pool, &params.collection).await?,
    };
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/versions/{id}
pub async fn get_version(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<impl IntoResponse> {
    let version = ensure_version_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: version }))
}

/// PATCH /api/v1/versions/{id}/delta
///
/// Replace the pending edits of a version. The hash is recomputed, and a
/// changed delta drops any review state so it must be reviewed again.
pub async fn save_delta(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
    Json(input): Json<SaveDelta>,
) -> AppResult<impl IntoResponse> {
    ensure_delta_object(&input.delta)?;

    let version = ContentVersionRepo::save_delta(&state.pool, id, &input.delta, auth.user_id)
        .await?
        .ok_or_else(|| version_not_found(id))?;

    tracing::info!(
        user_id = %auth.user_id,
        version_id = %id,
        hash = %version.hash,
        review_requested = version.review_requested,
        approved = version.approved,
        "Content version delta saved"
    );

    Ok(Json(DataResponse { data: version }))
}

/// DELETE /api/v1/versions/{id}
pub async fn delete_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<StatusCode> {
    if !ContentVersionRepo::delete(&state.pool, id).await? {
        return Err(version_not_found(id));
    }

    tracing::info!(user_id = %auth.user_id, version_id = %id, "Content version discarded");

    Ok(StatusCode::NO_CONTENT)
}

fn ensure_delta_object(delta: &serde_json::Value) -> AppResult<()> {
    if delta.is_object() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(
            "Delta must be a JSON object of field name to value".into(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Review workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/versions/{id}/request-review
///
/// Ask for a review. Clears any earlier decision.
pub async fn request_version_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<impl IntoResponse> {
    let version = ContentVersionRepo::apply_review(&state.pool, id, &request_review(), auth.user_id)
        .await?
        .ok_or_else(|| version_not_found(id))?;

    tracing::info!(user_id = %auth.user_id, version_id = %id, "Review requested");

    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/versions/{id}/approve
pub async fn approve_version(
    RequireReviewer(reviewer): RequireReviewer,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<impl IntoResponse> {
    let version = decide(&state.pool, id, ReviewDecision::Approve, &reviewer).await?;

    tracing::info!(user_id = %reviewer.user_id, version_id = %id, "Version approved");

    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/versions/{id}/reject
pub async fn reject_version(
    RequireReviewer(reviewer): RequireReviewer,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
    Json(input): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let decision = ReviewDecision::Reject {
        reason: input.reason,
    };
    let version = decide(&state.pool, id, decision, &reviewer).await?;

    tracing::info!(
        user_id = %reviewer.user_id,
        version_id = %id,
        reason = ?version.reject_reason,
        "Version rejected"
    );

    Ok(Json(DataResponse { data: version }))
}

async fn decide(
    pool: &PgPool,
    id: VersionId,
    decision: ReviewDecision,
    reviewer: &AuthUser,
) -> AppResult<ContentVersion> {
    let current = ensure_version_exists(pool, id).await?;
    let update = record_decision(&current, decision)?;
    ContentVersionRepo::apply_review(pool, id, &update, reviewer.user_id)
        .await?
        .ok_or_else(|| version_not_found(id))
}

/// GET /api/v1/versions/{id}/approval-state
///
/// Derived review flags for presentation.
pub async fn get_approval_state(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<impl IntoResponse> {
    let version = ensure_version_exists(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: derive_approval_state(Some(&version)),
    }))
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// POST /api/v1/versions/{id}/promote
///
/// Check the promotion guard, remove the version and return its delta. The
/// version row stays locked between the check and the delete.
pub async fn promote_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VersionId>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await?;

    let candidate = ContentVersionRepo::lock_for_promotion(&mut *tx, id)
        .await?
        .ok_or_else(|| version_not_found(id))?;

    check_promotable(&candidate.version, candidate.versioning_restrictions)?;

    ContentVersionRepo::delete(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %auth.user_id,
        version_id = %id,
        collection = %candidate.version.collection,
        item = %candidate.version.item,
        "Version promoted"
    );

    Ok(Json(DataResponse {
        data: PromotedVersion::from(candidate.version),
    }))
}
