//! versionflow API server library.
//!
//! The binary in `main.rs` only loads configuration, connects to Postgres and
//! serves [`app::build_router`]; everything else lives here so integration
//! tests drive the same router.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
