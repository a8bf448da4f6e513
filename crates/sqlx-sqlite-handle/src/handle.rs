use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_store::{SqliteStore, StoreConfig};
use tracing::debug;
use uuid::Uuid;

use crate::result_set::ResultSet;
use crate::transaction::{Statement, run_read_transaction, run_statement, run_write_transaction};
use crate::{Error, Result};

/// Whether a handle may write. Fixed when the handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
   ReadWrite,
   ReadOnly,
}

impl fmt::Display for AccessMode {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         AccessMode::ReadWrite => f.write_str("read-write"),
         AccessMode::ReadOnly => f.write_str("read-only"),
      }
   }
}

/// Options for [`Handle::open`].
///
/// ```
/// use sqlx_sqlite_handle::{AccessMode, OpenOptions};
///
/// let options = OpenOptions::new().read_only(true);
/// assert_eq!(options.mode(), AccessMode::ReadOnly);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
   read_only: bool,
   config: Option<StoreConfig>,
}

impl OpenOptions {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn read_only(mut self, read_only: bool) -> Self {
      self.read_only = read_only;
      self
   }

   /// Store configuration, used only if this open creates the store.
   pub fn config(mut self, config: StoreConfig) -> Self {
      self.config = Some(config);
      self
   }

   pub fn mode(&self) -> AccessMode {
      if self.read_only {
         AccessMode::ReadOnly
      } else {
         AccessMode::ReadWrite
      }
   }
}

/// A read-write or read-only reference to a named SQLite store.
///
/// Every handle opened on the same path shares one [`SqliteStore`]. Read-write
/// handles run on the store's single writer, so writes from any number of
/// handles are serialized. Read-only handles run on read-only connections, where
/// SQLite rejects writes.
pub struct Handle {
   id: Uuid,
   name: String,
   mode: AccessMode,
   store: Arc<SqliteStore>,
}

impl Handle {
   /// Open a handle on the store at `path`, creating the store if needed.
   pub async fn open(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
      let path = path.as_ref();
      let mode = options.mode();
      let store = SqliteStore::connect(path, options.config).await?;

      let name = path
         .file_name()
         .map(|name| name.to_string_lossy().into_owned())
         .unwrap_or_default();

      let handle = Self {
         id: Uuid::new_v4(),
         name,
         mode,
         store,
      };

      debug!(handle = %handle.id, store = %handle.name, mode = %handle.mode, "Opened handle");
      Ok(handle)
   }

   /// Open a handle on store `name` inside the `location` directory.
   pub async fn open_in(location: &Path, name: &str, options: OpenOptions) -> Result<Self> {
      let path = resolve_store_path(location, name).await?;
      Self::open(path, options).await
   }

   /// Execute a single statement in autocommit mode.
   pub async fn execute(
      &self,
      query: impl Into<String>,
      values: Vec<JsonValue>,
   ) -> Result<ResultSet> {
      let statement = Statement::new(query).with_values(values);

      match self.mode {
         AccessMode::ReadWrite => {
            let mut writer = self.store.acquire_writer().await?;
            run_statement(&mut writer, statement).await
         }
         AccessMode::ReadOnly => {
            let mut reader = self.store.acquire_reader().await?;
            run_statement(&mut reader, statement).await
         }
      }
   }

   /// Execute `statements` atomically and return one result set per statement.
   ///
   /// Read-write handles hold the writer for the whole batch under
   /// `BEGIN IMMEDIATE`. Read-only handles read from one consistent snapshot.
   /// Any failure rolls the whole batch back.
   pub async fn transaction(&self, statements: Vec<Statement>) -> Result<Vec<ResultSet>> {
      debug!(handle = %self.id, statements = statements.len(), "Starting transaction");

      match self.mode {
         AccessMode::ReadWrite => {
            let mut writer = self.store.acquire_writer().await?;
            run_write_transaction(&mut writer, statements).await
         }
         AccessMode::ReadOnly => {
            let mut reader = self.store.acquire_reader().await?;
            run_read_transaction(&mut reader, statements).await
         }
      }
   }

   /// Close the underlying store. Every handle sharing it is closed too.
   pub async fn close(self) -> Result<()> {
      debug!(handle = %self.id, store = %self.name, "Closing store");
      self.store.close().await?;
      Ok(())
   }

   /// Close the underlying store and delete its files.
   pub async fn delete(self) -> Result<()> {
      debug!(handle = %self.id, store = %self.name, "Deleting store");
      self.store.remove().await?;
      Ok(())
   }

   pub fn id(&self) -> Uuid {
      self.id
   }

   /// Store file name this handle was opened on.
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn mode(&self) -> AccessMode {
      self.mode
   }

   pub fn is_read_only(&self) -> bool {
      self.mode == AccessMode::ReadOnly
   }

   pub fn store(&self) -> &Arc<SqliteStore> {
      &self.store
   }
}

impl fmt::Debug for Handle {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Handle")
         .field("id", &self.id)
         .field("name", &self.name)
         .field("mode", &self.mode)
         .finish_non_exhaustive()
   }
}

/// Resolve a store name to a file inside `location`, creating the directory.
///
/// Names must be a single plain file name so a store can never escape its location.
pub async fn resolve_store_path(location: &Path, name: &str) -> Result<PathBuf> {
   let is_plain = !name.is_empty()
      && name != "."
      && name != ".."
      && !name.contains(|c| c == '/' || c == '\\' || c == '\0');

   if !is_plain {
      return Err(Error::InvalidStoreName(name.to_string()));
   }

   tokio::fs::create_dir_all(location).await?;
   Ok(location.join(name))
}
