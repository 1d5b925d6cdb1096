/// Content version identifiers are UUID v7 (time-ordered, opaque to clients).
pub type VersionId = uuid::Uuid;

/// User identifiers, taken from the `sub` claim of the access token.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
