//! Domain errors shared by the db and api layers.

/// Error code surfaced to clients when a promotion precondition fails.
pub const UNPROMOTEABLE_VERSION_CODE: &str = "UNPROMOTEABLE_VERSION";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A version failed its promotion precondition. Surfaced as 403.
    #[error("Can't promote version. {reason}.")]
    UnpromoteableVersion { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build an [`CoreError::UnpromoteableVersion`] from any reason text.
    pub fn unpromoteable(reason: impl Into<String>) -> Self {
        CoreError::UnpromoteableVersion {
            reason: reason.into(),
        }
    }
}
