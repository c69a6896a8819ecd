//! Database module: models and schema for document metadata.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup and the `DocumentStorage` repository

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::DocumentRecord;
pub use schema::SQLITE_INIT;
pub use sqlite::{DocumentStorage, SqlitePool, connect};
