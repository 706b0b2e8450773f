//! Campus Database — SurrealDB connection management, migrations and
//! repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `campus-core` repository traits, including
//!   the bulk [`ProgressSource`](campus_core::repository::ProgressSource)
//!   reads used by the progress engine

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{latest_version, run_migrations, schema_v1};
