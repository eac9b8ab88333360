//! Credimo Database — SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - SurrealDB implementations of every `credimo-core` repository
//!   trait, generic over the connection engine
//! - Idempotent startup seeding ([`seed_stages`], [`seed_admin`])

mod connection;
mod error;
mod schema;
mod seed;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::hash_password;
pub use schema::run_migrations;
pub use seed::{ADMIN_EMAIL, seed_admin, seed_stages};
