//! Collection-level versioning configuration.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `collections` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CollectionSettings {
    pub collection: String,
    /// Whether content versions may be created for items of this collection.
    pub versioning: bool,
    /// When set, only approved versions may be promoted.
    pub versioning_restrictions: bool,
}

/// DTO for creating or patching collection settings. Missing fields keep
/// their current value (or the column default on insert).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertCollection {
    pub versioning: Option<bool>,
    pub versioning_restrictions: Option<bool>,
}
