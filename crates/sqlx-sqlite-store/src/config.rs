//! Configuration for SQLite store connection pools

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Journal mode applied by the writer when a store is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
   /// Write-Ahead Logging: readers never block the writer and vice versa
   #[default]
   Wal,
   /// Classic rollback journal with shared/exclusive file locks
   Delete,
}

impl JournalMode {
   /// Value used in `PRAGMA journal_mode = ...`
   pub fn as_pragma(&self) -> &'static str {
      match self {
         JournalMode::Wal => "WAL",
         JournalMode::Delete => "DELETE",
      }
   }
}

/// Configuration for SqliteStore connection pools
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_store::{JournalMode, StoreConfig};
/// use std::time::Duration;
///
/// // Use defaults
/// let config = StoreConfig::default();
///
/// // Rollback journal with a shorter lock wait
/// let config = StoreConfig {
///     journal_mode: JournalMode::Delete,
///     busy_timeout: Duration::from_secs(1),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
   /// Maximum number of concurrent read-only connections
   ///
   /// Default: 6
   pub max_read_connections: u32,

   /// Idle timeout for both read and write connections
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,

   /// How long a connection waits on a locked database before failing with SQLITE_BUSY
   ///
   /// Only matters for the rollback journal, where readers hold shared locks the
   /// writer has to wait out.
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,

   /// Journal mode applied when the store is opened
   ///
   /// Default: WAL
   pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 6,
         idle_timeout: Duration::from_secs(30),
         busy_timeout: Duration::from_secs(5),
         journal_mode: JournalMode::Wal,
      }
   }
}
