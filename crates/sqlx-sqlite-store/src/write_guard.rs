//! RAII guard for exclusive write access

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, warn};

use crate::error::Result;

/// Exclusive handle on the store's single write connection.
///
/// The write pool holds exactly one connection, so while a `WriteGuard` is alive
/// every other call to [`SqliteStore::acquire_writer`](crate::SqliteStore::acquire_writer)
/// waits. Dropping the guard returns the connection to the pool.
///
/// Transactions started with [`WriteGuard::begin`] are tracked. If the guard is
/// dropped before [`commit`](WriteGuard::commit) or [`rollback`](WriteGuard::rollback)
/// finishes (a cancelled future, for example), the next `acquire_writer` rolls
/// the transaction back before handing out the connection. SQLite does not do
/// this on its own: an untracked `BEGIN` issued through `Deref` stays open
/// until the caller ends it.
#[must_use = "if unused, the write lock is immediately released"]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
   in_transaction: bool,
   abandoned: Arc<AtomicBool>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>, abandoned: Arc<AtomicBool>) -> Self {
      Self {
         conn,
         in_transaction: false,
         abandoned,
      }
   }

   /// Start a tracked transaction with `statement` (`BEGIN IMMEDIATE`, usually).
   pub async fn begin(&mut self, statement: &str) -> Result<()> {
      // Marked first: a drop while BEGIN is in flight may still leave it open
      self.in_transaction = true;
      let result = sqlx::query(statement).execute(&mut *self.conn).await;
      if result.is_err() {
         self.in_transaction = false;
      }
      result?;
      Ok(())
   }

   /// Commit the tracked transaction.
   ///
   /// A failed COMMIT leaves the transaction open; roll it back.
   pub async fn commit(&mut self) -> Result<()> {
      sqlx::query("COMMIT").execute(&mut *self.conn).await?;
      self.in_transaction = false;
      Ok(())
   }

   pub async fn rollback(&mut self) -> Result<()> {
      sqlx::query("ROLLBACK").execute(&mut *self.conn).await?;
      self.in_transaction = false;
      Ok(())
   }

   pub fn in_transaction(&self) -> bool {
      self.in_transaction
   }

   /// Roll back a transaction a previous guard left open.
   pub(crate) async fn discard_abandoned(&mut self) {
      self.in_transaction = true;
      match sqlx::query("ROLLBACK").execute(&mut *self.conn).await {
         Ok(_) => debug!("Rolled back transaction left open by a dropped writer"),
         // "no transaction is active" when the dropped BEGIN never ran
         Err(e) => warn!(error = %e, "Rollback of abandoned transaction failed"),
      }
      self.in_transaction = false;
   }
}

impl Drop for WriteGuard {
   fn drop(&mut self) {
      if self.in_transaction {
         self.abandoned.store(true, Ordering::Release);
      }
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
