//! # sqlx-sqlite-store
//!
//! Named SQLite stores on top of SQLx: one serialized writer, many read-only
//! readers, one shared instance per database file.
//!
//! ## Core Types
//!
//! - **[`SqliteStore`]**: A database file with separate read and write connection pools
//! - **[`StoreConfig`]**: Pool sizes, timeouts and journal mode
//! - **[`WriteGuard`]**: RAII guard ensuring exclusive write access
//! - **[`Error`]**: Error type for store operations
//!
//! ## Architecture
//!
//! - **Dual pools**: read-only pool (max 6 connections by default) and write pool (max 1 connection)
//! - **Read-only readers**: read connections are opened with `SQLITE_OPEN_READONLY`
//! - **Journal mode on open**: WAL (or rollback journal) applied when the store is first opened
//! - **Shared identity**: a registry returns the same store for every connect to one path
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_store::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> sqlx_sqlite_store::Result<()> {
//!     let db = SqliteStore::connect("example.db", None).await?;
//!
//!     // Same path, same store
//!     let db2 = SqliteStore::connect("example.db", None).await?;
//!     assert!(Arc::ptr_eq(&db, &db2));
//!
//!     let mut writer = db.acquire_writer().await?;
//!     sqlx::query("CREATE TABLE IF NOT EXISTS users (name TEXT)")
//!         .execute(&mut *writer)
//!         .await?;
//!     drop(writer);
//!
//!     let rows = sqlx::query("SELECT * FROM users")
//!         .fetch_all(db.read_pool()?)
//!         .await?;
//!
//!     db.close().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod database;
mod error;
mod registry;
mod write_guard;

pub use config::{JournalMode, StoreConfig};
pub use database::SqliteStore;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;

/// Close every open store in this process.
///
/// Failures are logged and skipped so one broken store cannot keep the
/// others open.
pub async fn close_all() {
   registry::close_all().await;
}
