//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the `Deserialize` DTOs used to write it.

pub mod collection;
pub mod content_version;
