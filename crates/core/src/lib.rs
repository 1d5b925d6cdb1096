//! Domain logic for the content version approval workflow.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db` crate
//! persists the records described here and the `api` crate exposes them.

pub mod error;
pub mod hashing;
pub mod roles;
pub mod schema;
pub mod types;
pub mod versioning;
