//! Role checks layered on [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use versionflow_core::error::CoreError;
use versionflow_core::roles::{can_review, ROLE_ADMIN};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticate, then refuse with 403 unless `allowed` accepts the role.
async fn authorize(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(&str) -> bool,
    denied: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed(&user.role) {
        tracing::debug!(user_id = %user.user_id, role = %user.role, "Role check failed");
        return Err(AppError::Core(CoreError::Forbidden(denied.to_string())));
    }
    Ok(user)
}

/// Admin only. Guards collection settings.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, |role| role == ROLE_ADMIN, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Reviewer or admin. Guards approve and reject.
pub struct RequireReviewer(pub AuthUser);

impl FromRequestParts<AppState> for RequireReviewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, can_review, "Reviewer or Admin role required")
            .await
            .map(RequireReviewer)
    }
}
