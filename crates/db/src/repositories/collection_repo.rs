//! Repository for the `collections` table.

use sqlx::PgPool;

use crate::models::collection::{CollectionSettings, UpsertCollection};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "collection, versioning, versioning_restrictions";

/// Provides read and upsert operations for collection settings.
pub struct CollectionRepo;

impl CollectionRepo {
    /// Insert settings for `collection`, or patch the existing row. `None`
    /// fields keep their current value (column default on insert).
    pub async fn upsert(
        pool: &PgPool,
        collection: &str,
        input: &UpsertCollection,
    ) -> Result<CollectionSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO collections (collection, versioning, versioning_restrictions)
             VALUES ($1, COALESCE($2, false), COALESCE($3, false))
             ON CONFLICT (collection) DO UPDATE SET
                versioning = COALESCE($2, collections.versioning),
                versioning_restrictions = COALESCE($3, collections.versioning_restrictions)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CollectionSettings>(&query)
            .bind(collection)
            .bind(input.versioning)
            .bind(input.versioning_restrictions)
            .fetch_one(pool)
            .await
    }

    /// Find the settings of a collection by name.
    pub async fn find(
        pool: &PgPool,
        collection: &str,
    ) -> Result<Option<CollectionSettings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM collections WHERE collection = $1");
        sqlx::query_as::<_, CollectionSettings>(&query)
            .bind(collection)
            .fetch_optional(pool)
            .await
    }

    /// Toggle the promotion restriction of an existing collection.
    ///
    /// Returns `None` if the collection does not exist.
    pub async fn set_versioning_restrictions(
        pool: &PgPool,
        collection: &str,
        restricted: bool,
    ) -> Result<Option<CollectionSettings>, sqlx::Error> {
        let query = format!(
            "UPDATE collections SET versioning_restrictions = $2
             WHERE collection = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CollectionSettings>(&query)
            .bind(collection)
            .bind(restricted)
            .fetch_optional(pool)
            .await
    }
}
