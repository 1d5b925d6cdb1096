//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or any executor, for transactional work) as the
//! first argument.

pub mod collection_repo;
pub mod content_version_repo;

pub use collection_repo::CollectionRepo;
pub use content_version_repo::ContentVersionRepo;
