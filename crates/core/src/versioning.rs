//! Version review workflow: derived approval state, review transitions and
//! the promotion guard.
//!
//! A version moves through review as follows:
//!
//! ```text
//! saved --request_review--> review requested --record_decision--> reviewed
//!                                                                   |-- approved
//!                                                                   `-- rejected (reason)
//! ```
//!
//! Changing the delta sends the version back to `saved` ([`reset_review`]),
//! so an approval only ever covers the delta that was reviewed.
//!
//! The persisted fields (`review_requested`, `reviewed`, `approved`,
//! `reject_reason`) are written by the db layer from a [`ReviewUpdate`];
//! presentation code reads them back through [`derive_approval_state`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a rejection reason. Matches the `VARCHAR(255)` column.
pub const MAX_REJECT_REASON_LENGTH: usize = 255;

/// Maximum length of a version key.
pub const MAX_VERSION_KEY_LENGTH: usize = 64;

/// Reason attached to the promotion failure for unapproved versions.
pub const REASON_NOT_APPROVED: &str = "Version not approved";

/// Version keys are short slugs: letters, digits, `-` and `_`.
static VERSION_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Review fields
// ---------------------------------------------------------------------------

/// Read access to the persisted review fields of a version record.
pub trait ReviewStatus {
    fn review_requested(&self) -> bool;
    fn reviewed(&self) -> bool;
    fn approved(&self) -> bool;
    fn reject_reason(&self) -> Option<&str>;
}

/// Derived review lifecycle flags consumed by presentation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApprovalState {
    pub is_reviewing: bool,
    pub is_reviewed: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub rejected_reason: String,
}

/// Compute the [`ApprovalState`] of a version, or the all-false state when
/// there is no version.
///
/// `is_rejected` is `!approved`, so a version that was never reviewed also
/// reports as rejected. Callers that need "explicitly rejected" should check
/// `is_reviewed && is_rejected`.
pub fn derive_approval_state<V: ReviewStatus + ?Sized>(version: Option<&V>) -> ApprovalState {
    let Some(version) = version else {
        return ApprovalState::default();
    };

    ApprovalState {
        is_reviewing: version.review_requested(),
        is_reviewed: version.reviewed(),
        is_approved: version.approved(),
        is_rejected: !version.approved(),
        rejected_reason: version
            .reject_reason()
            .filter(|reason| !reason.is_empty())
            .unwrap_or_default()
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// The review fields to persist after a review action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub review_requested: bool,
    pub reviewed: bool,
    pub approved: bool,
    pub reject_reason: Option<String>,
}

/// A reviewer's decision on a version under review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

/// Ask for a review. Any earlier decision is cleared so the new request starts
/// from a clean slate.
pub fn request_review() -> ReviewUpdate {
    ReviewUpdate {
        review_requested: true,
        reviewed: false,
        approved: false,
        reject_reason: None,
    }
}

/// Drop all review state. Applied when a version's delta changes.
pub fn reset_review() -> ReviewUpdate {
    ReviewUpdate {
        review_requested: false,
        reviewed: false,
        approved: false,
        reject_reason: None,
    }
}

/// Record a reviewer's decision on `current`.
///
/// Fails with [`CoreError::Conflict`] if no review was requested, and with
/// [`CoreError::Validation`] if a rejection reason is blank or too long.
pub fn record_decision<V: ReviewStatus + ?Sized>(
    current: &V,
    decision: ReviewDecision,
) -> Result<ReviewUpdate, CoreError> {
    if !current.review_requested() {
        return Err(CoreError::Conflict(
            "A review must be requested before a decision can be recorded".to_string(),
        ));
    }

    match decision {
        ReviewDecision::Approve => Ok(ReviewUpdate {
            review_requested: true,
            reviewed: true,
            approved: true,
            reject_reason: None,
        }),
        ReviewDecision::Reject { reason } => {
            validate_reject_reason(&reason)?;
            Ok(ReviewUpdate {
                review_requested: true,
                reviewed: true,
                approved: false,
                reject_reason: Some(reason.trim().to_string()),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Promotion guard
// ---------------------------------------------------------------------------

/// Check whether `version` may be promoted into live content.
///
/// Only collections with `versioning_restrictions` enabled require approval;
/// unrestricted collections promote any version.
pub fn check_promotable<V: ReviewStatus + ?Sized>(
    version: &V,
    versioning_restrictions: bool,
) -> Result<(), CoreError> {
    if versioning_restrictions && !version.approved() {
        return Err(CoreError::unpromoteable(REASON_NOT_APPROVED));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a rejection reason: non-blank and within
/// [`MAX_REJECT_REASON_LENGTH`] characters.
pub fn validate_reject_reason(reason: &str) -> Result<(), CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Reject reason must not be empty".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_REJECT_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Reject reason must not exceed {MAX_REJECT_REASON_LENGTH} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate a version key: a non-empty slug of at most
/// [`MAX_VERSION_KEY_LENGTH`] characters.
pub fn validate_version_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() {
        return Err(CoreError::Validation(
            "Version key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_VERSION_KEY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Version key must not exceed {MAX_VERSION_KEY_LENGTH} characters, got {}",
            key.len()
        )));
    }
    if !VERSION_KEY_RE.is_match(key) {
        return Err(CoreError::Validation(format!(
            "Version key '{key}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
