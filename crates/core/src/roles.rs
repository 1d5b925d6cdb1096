//! Role names carried in access tokens.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_REVIEWER: &str = "reviewer";
pub const ROLE_EDITOR: &str = "editor";

/// Whether `role` may record review decisions.
pub fn can_review(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_REVIEWER
}
