//! # sqlx-sqlite-handle
//!
//! Read-write and read-only handles over a shared [`sqlx_sqlite_store::SqliteStore`].
//!
//! Any number of handles can be opened on one store name. They all share the
//! store's single writer and its read-only connection pool:
//!
//! - **[`Handle::execute`]**: one statement in autocommit mode
//! - **[`Handle::transaction`]**: an ordered batch that commits atomically or not at all
//! - **[`ResultSet`]**: rows addressable by index, values projected by column name
//!
//! ```no_run
//! use serde_json::json;
//! use sqlx_sqlite_handle::{Handle, OpenOptions, Statement};
//! use std::path::Path;
//!
//! # async fn demo() -> sqlx_sqlite_handle::Result<()> {
//! let location = Path::new("/tmp/stores");
//! let writer = Handle::open_in(location, "app.db", OpenOptions::new()).await?;
//! let reader = Handle::open_in(location, "app.db", OpenOptions::new().read_only(true)).await?;
//!
//! writer
//!    .transaction(vec![
//!       Statement::new("CREATE TABLE IF NOT EXISTS notes (body TEXT)"),
//!       Statement::new("INSERT INTO notes VALUES (?)").with_values(vec![json!("hi")]),
//!    ])
//!    .await?;
//!
//! let rs = reader.execute("SELECT body FROM notes", vec![]).await?;
//! assert_eq!(rs.value(0, "body"), Some(&json!("hi")));
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod handle;
mod result_set;
mod transaction;

pub use error::{Error, Result};
pub use handle::{AccessMode, Handle, OpenOptions, resolve_store_path};
pub use result_set::{ResultSet, Row};
pub use transaction::Statement;

pub use sqlx_sqlite_store::{JournalMode, StoreConfig, close_all};
