//! HTTP error type and its JSON rendering.
//!
//! Every error response has the shape `{ "error": <message>, "code": <CODE> }`.
//! Refused promotions also carry `"extensions": { "reason": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use versionflow_core::error::{CoreError, UNPROMOTEABLE_VERSION_CODE};

/// Error returned by handlers and extractors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Serialize)]
struct ErrorExtensions {
    reason: String,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl ErrorBody {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            extensions: None,
        }
    }

    fn internal() -> Self {
        Self::new("INTERNAL_ERROR", INTERNAL_MESSAGE)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Core(core) => core_error_body(core),
            AppError::Database(err) => database_error_body(&err),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("BAD_REQUEST", msg))
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
            }
        };

        (status, Json(body)).into_response()
    }
}

fn core_error_body(core: CoreError) -> (StatusCode, ErrorBody) {
    // Display text of the domain error; refused promotions surface it as is.
    let message = core.to_string();
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", format!("{entity} with id {id} not found")),
        ),
        CoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("VALIDATION_ERROR", msg),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("CONFLICT", msg)),
        CoreError::Unauthorized(msg) => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("UNAUTHORIZED", msg),
        ),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", msg)),
        CoreError::UnpromoteableVersion { reason } => {
            tracing::info!(reason = %reason, "Promotion refused");
            let body = ErrorBody {
                error: message,
                code: UNPROMOTEABLE_VERSION_CODE,
                extensions: Some(ErrorExtensions { reason }),
            };
            (StatusCode::FORBIDDEN, body)
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
        }
    }
}

/// `RowNotFound` is a 404, unique violations on `uq_*` constraints are a 409,
/// anything else is logged and hidden behind a 500.
fn database_error_body(err: &sqlx::Error) -> (StatusCode, ErrorBody) {
    if let sqlx::Error::RowNotFound = err {
        return (
            StatusCode::NOT_FOUND,
            ErrorBody::new("NOT_FOUND", "Resource not found"),
        );
    }

    if let sqlx::Error::Database(db_err) = err {
        let unique_violation = db_err.code().as_deref() == Some("23505");
        if let Some(constraint) = db_err.constraint().filter(|c| c.starts_with("uq_")) {
            if unique_violation {
                return (
                    StatusCode::CONFLICT,
                    ErrorBody::new(
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    ),
                );
            }
        }
    }

    tracing::error!(error = %err, "Database error");
    (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::internal())
}
