//! Content version entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use versionflow_core::types::{Timestamp, UserId, VersionId};
use versionflow_core::versioning::ReviewStatus;

/// A row from the `content_versions` table: a named snapshot of pending
/// edits to one item.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, TS)]
#[ts(export)]
pub struct ContentVersion {
    pub id: VersionId,
    pub key: String,
    pub name: Option<String>,
    pub collection: String,
    pub item: String,
    pub hash: String,
    pub review_requested: bool,
    pub reviewed: bool,
    pub approved: bool,
    pub reject_reason: Option<String>,
    pub date_created: Timestamp,
    pub date_updated: Option<Timestamp>,
    pub user_created: Option<UserId>,
    pub user_updated: Option<UserId>,
    pub delta: Option<serde_json::Value>,
}

impl ReviewStatus for ContentVersion {
    fn review_requested(&self) -> bool {
        self.review_requested
    }

    fn reviewed(&self) -> bool {
        self.reviewed
    }

    fn approved(&self) -> bool {
        self.approved
    }

    fn reject_reason(&self) -> Option<&str> {
        self.reject_reason.as_deref()
    }
}

/// A version locked for promotion together with its collection's
/// restriction flag.
#[derive(Debug, Clone, FromRow)]
pub struct PromotionCandidate {
    #[sqlx(flatten)]
    pub version: ContentVersion,
    pub versioning_restrictions: bool,
}

/// DTO for creating a new content version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentVersion {
    pub key: String,
    pub name: Option<String>,
    pub collection: String,
    pub item: String,
    pub delta: Option<serde_json::Value>,
}

/// Request body for saving a version's pending edits.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveDelta {
    pub delta: serde_json::Value,
}

/// Request body for the reject endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Query parameters for listing versions.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionListParams {
    pub collection: String,
    pub item: Option<String>,
}

/// Response body of a successful promotion: the edits to merge into the
/// live item.
#[derive(Debug, Clone, Serialize)]
pub struct PromotedVersion {
    pub id: VersionId,
    pub collection: String,
    pub item: String,
    pub delta: Option<serde_json::Value>,
}

impl From<ContentVersion> for PromotedVersion {
    fn from(version: ContentVersion) -> Self {
        Self {
            id: version.id,
            collection: version.collection,
            item: version.item,
            delta: version.delta,
        }
    }
}
