//! SQLite store with a serialized writer and concurrent read-only connections

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::registry;
use crate::write_guard::WriteGuard;

/// Named SQLite store with pooled read-only connections and one exclusive writer.
///
/// ## Architecture
///
/// The store maintains two connection pools over the same file:
/// - **`read_pool`**: read-only connections (`SQLITE_OPEN_READONLY`), so SQLite
///   itself rejects any write issued through them
/// - **`write_conn`**: single-connection pool for exclusive, serialized writes
///
/// ## Identity
///
/// Stores are registered by canonical path. Connecting twice to the same path
/// returns the same `Arc<SqliteStore>` for as long as it stays open.
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect (creates the file and applies the journal mode, or reuses an open store)
/// 2. Reads: read_pool() / acquire_reader()
/// 3. Writes: acquire_writer() (waits while another writer is active)
/// 4. close() or remove() when done
/// ```
pub struct SqliteStore {
   /// Read-only connections for concurrent reads
   read_pool: Pool<Sqlite>,

   /// Single read-write connection (max_connections=1) for serialized writes
   write_conn: Pool<Sqlite>,

   /// Marks the store as closed to prevent further operations
   closed: AtomicBool,

   /// Set when a `WriteGuard` is dropped inside a tracked transaction
   abandoned_tx: Arc<AtomicBool>,

   /// Canonical path of the database file (registry key)
   path: PathBuf,

   config: StoreConfig,
}

impl SqliteStore {
   /// Connect to the store at `path`, or return the already-open store for it.
   ///
   /// The parent directory must exist. `custom_config` only applies when a new
   /// store is opened; an existing store keeps the configuration it was opened with.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<StoreConfig>,
   ) -> Result<Arc<Self>> {
      let key = registry::registry_key(path.as_ref()).await?;
      let config = custom_config.unwrap_or_default();

      registry::get_or_open(key, |key| Self::open(key, config)).await
   }

   async fn open(path: PathBuf, config: StoreConfig) -> Result<Arc<Self>> {
      let options = SqliteConnectOptions::new()
         .filename(&path)
         .busy_timeout(config.busy_timeout);

      // The writer connects eagerly and stays connected: it creates the file and,
      // in WAL mode, keeps the -shm index alive, which read-only connections
      // cannot create on their own.
      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .min_connections(1)
         .idle_timeout(config.idle_timeout)
         .connect_with(options.clone().create_if_missing(true))
         .await?;

      let pragma = format!("PRAGMA journal_mode = {}", config.journal_mode.as_pragma());
      sqlx::query(&pragma).execute(&write_conn).await?;

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_read_connections.max(1))
         .idle_timeout(config.idle_timeout)
         .connect_lazy_with(options.read_only(true));

      debug!(
         path = %path.display(),
         max_read_connections = config.max_read_connections,
         journal_mode = config.journal_mode.as_pragma(),
         "Opened database"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         closed: AtomicBool::new(false),
         abandoned_tx: Arc::new(AtomicBool::new(false)),
         path,
         config,
      }))
   }

   /// Pool of read-only connections.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      self.ensure_open()?;
      Ok(&self.read_pool)
   }

   /// Acquire a single read-only connection from the read pool.
   pub async fn acquire_reader(&self) -> Result<PoolConnection<Sqlite>> {
      let conn = self.read_pool()?.acquire().await?;
      trace!("Acquired reader for {}", self.path.display());
      Ok(conn)
   }

   /// Acquire exclusive write access.
   ///
   /// Waits while another `WriteGuard` is alive. A transaction the previous
   /// guard left open is rolled back first.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      self.ensure_open()?;
      let conn = self.write_conn.acquire().await?;
      let mut guard = WriteGuard::new(conn, Arc::clone(&self.abandoned_tx));

      if self.abandoned_tx.swap(false, Ordering::AcqRel) {
         guard.discard_abandoned().await;
      }

      trace!("Acquired writer for {}", self.path.display());
      Ok(guard)
   }

   /// Close both pools and drop the store from the registry.
   ///
   /// Idempotent. Waits for checked-out connections (including a live
   /// `WriteGuard`) to be returned.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.write_conn.close().await;
      self.read_pool.close().await;
      registry::unregister(self).await;

      debug!("Closed database: {}", self.path.display());
      Ok(())
   }

   /// Close the store and delete the database file and its journal companions.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      for file in database_files(&self.path) {
         match tokio::fs::remove_file(&file).await {
            Ok(()) => trace!("Removed {}", file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
         }
      }

      debug!("Removed database: {}", self.path.display());
      Ok(())
   }

   /// Canonical path of the database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   pub fn config(&self) -> &StoreConfig {
      &self.config
   }

   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   fn ensure_open(&self) -> Result<()> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(())
   }
}

impl std::fmt::Debug for SqliteStore {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("SqliteStore")
         .field("path", &self.path)
         .field("config", &self.config)
         .field("closed", &self.is_closed())
         .finish_non_exhaustive()
   }
}

/// The database file followed by every companion file SQLite may create next to it.
fn database_files(path: &Path) -> Vec<PathBuf> {
   let mut files = vec![path.to_path_buf()];
   for suffix in ["-wal", "-shm", "-journal"] {
      let mut name = OsString::from(path.as_os_str());
      name.push(suffix);
      files.push(PathBuf::from(name));
   }
   files
}
