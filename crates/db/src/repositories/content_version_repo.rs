//! Repository for the `content_versions` table.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;
use versionflow_core::hashing::delta_hash;
use versionflow_core::types::{UserId, VersionId};
use versionflow_core::versioning::{reset_review, ReviewUpdate};

use crate::models::content_version::{ContentVersion, CreateContentVersion, PromotionCandidate};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, key, name, collection, item, hash, \
    review_requested, reviewed, approved, reject_reason, \
    date_created, date_updated, user_created, user_updated, delta";

/// Provides CRUD and review operations for content versions.
pub struct ContentVersionRepo;

impl ContentVersionRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new version, assigning a UUID v7 id and hashing its delta.
    ///
    /// Review fields start at their column defaults (all false, no reason).
    pub async fn create(
        pool: &PgPool,
        input: &CreateContentVersion,
        user_id: UserId,
    ) -> Result<ContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (id, key, name, collection, item, hash, user_created, delta)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.key)
            .bind(&input.name)
            .bind(&input.collection)
            .bind(&input.item)
            .bind(delta_hash(input.delta.as_ref()))
            .bind(user_id)
            .bind(&input.delta)
            .fetch_one(pool)
            .await
    }

    /// Find a version by its id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: VersionId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_versions WHERE id = $1");
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all versions of one item, newest first.
    pub async fn list_for_item(
        pool: &PgPool,
        collection: &str,
        item: &str,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE collection = $1 AND item = $2
             ORDER BY date_created DESC, id DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(collection)
            .bind(item)
            .fetch_all(pool)
            .await
    }

    /// List all versions in a collection, newest first.
    pub async fn list_for_collection(
        pool: &PgPool,
        collection: &str,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE collection = $1
             ORDER BY date_created DESC, id DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(collection)
            .fetch_all(pool)
            .await
    }

    /// Replace a version's pending edits and refresh its hash.
    ///
    /// If the hash changes, the review fields are reset with
    /// [`reset_review`], so an earlier approval does not carry over to
    /// unreviewed edits. Saving an identical delta keeps them.
    ///
    /// Returns `None` if no version with the given `id` exists.
    pub async fn save_delta(
        pool: &PgPool,
        id: VersionId,
        delta: &serde_json::Value,
        user_id: UserId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        // Right-hand `hash` is the value before this update.
        let query = format!(
            "UPDATE content_versions SET
                delta = $2,
                hash = $3,
                review_requested = CASE WHEN hash = $3 THEN review_requested ELSE $5 END,
                reviewed = CASE WHEN hash = $3 THEN reviewed ELSE $6 END,
                approved = CASE WHEN hash = $3 THEN approved ELSE $7 END,
                reject_reason = CASE WHEN hash = $3 THEN reject_reason ELSE $8 END,
                user_updated = $4,
                date_updated = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let reset = reset_review();
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .bind(delta)
            .bind(delta_hash(Some(delta)))
            .bind(user_id)
            .bind(reset.review_requested)
            .bind(reset.reviewed)
            .bind(reset.approved)
            .bind(reset.reject_reason)
            .fetch_optional(pool)
            .await
    }

    /// Delete a version. Returns `true` if a row was removed.
    pub async fn delete<'e>(
        executor: impl PgExecutor<'e>,
        id: VersionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content_versions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Review workflow ──────────────────────────────────────────────

    /// Persist the review fields of `update`.
    ///
    /// Returns `None` if no version with the given `id` exists.
    pub async fn apply_review(
        pool: &PgPool,
        id: VersionId,
        update: &ReviewUpdate,
        user_id: UserId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE content_versions SET
                review_requested = $2,
                reviewed = $3,
                approved = $4,
                reject_reason = $5,
                user_updated = $6,
                date_updated = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .bind(update.review_requested)
            .bind(update.reviewed)
            .bind(update.approved)
            .bind(&update.reject_reason)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a version row for promotion and read its collection's
    /// restriction flag. Must run inside a transaction for the lock to hold.
    pub async fn lock_for_promotion<'e>(
        executor: impl PgExecutor<'e>,
        id: VersionId,
    ) -> Result<Option<PromotionCandidate>, sqlx::Error> {
        sqlx::query_as::<_, PromotionCandidate>(
            "SELECT v.id, v.key, v.name, v.collection, v.item, v.hash,
                    v.review_requested, v.reviewed, v.approved, v.reject_reason,
                    v.date_created, v.date_updated, v.user_created, v.user_updated, v.delta,
                    c.versioning_restrictions
             FROM content_versions v
             JOIN collections c ON c.collection = v.collection
             WHERE v.id = $1
             FOR UPDATE OF v",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
