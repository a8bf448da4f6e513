//! Integration tests for SqliteStore pools, identity and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use sqlx_sqlite_store::{Error, JournalMode, SqliteStore, StoreConfig};
use tempfile::TempDir;
use tokio::time::timeout;

async fn setup_store(config: Option<StoreConfig>) -> (Arc<SqliteStore>, TempDir) {
   let temp_dir = TempDir::new().unwrap();
   let db = SqliteStore::connect(temp_dir.path().join("store.db"), config)
      .await
      .unwrap();

   (db, temp_dir)
}

async fn create_items_table(db: &SqliteStore) {
   let mut writer = db.acquire_writer().await.unwrap();
   sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
      .execute(&mut *writer)
      .await
      .unwrap();
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_connect_creates_file() {
   let (db, temp) = setup_store(None).await;

   assert!(temp.path().join("store.db").exists());
   assert!(!db.is_closed());
}

#[tokio::test]
async fn test_same_path_returns_same_store() {
   let (db, temp) = setup_store(None).await;

   // Non-canonical spelling of the same file still resolves to the same key
   let alias = temp.path().join(".").join("store.db");
   let db2 = SqliteStore::connect(&alias, None).await.unwrap();

   assert!(Arc::ptr_eq(&db, &db2));
}

#[tokio::test]
async fn test_different_paths_are_independent() {
   let (db, temp) = setup_store(None).await;
   let other = SqliteStore::connect(temp.path().join("other.db"), None)
      .await
      .unwrap();

   assert!(!Arc::ptr_eq(&db, &other));
}

#[tokio::test]
async fn test_missing_parent_directory_fails() {
   let temp = TempDir::new().unwrap();
   let result = SqliteStore::connect(temp.path().join("missing").join("x.db"), None).await;

   assert!(matches!(result, Err(Error::Io(_))));
}

// ============================================================================
// Read / Write Isolation
// ============================================================================

#[tokio::test]
async fn test_read_pool_rejects_writes() {
   let (db, _temp) = setup_store(None).await;
   create_items_table(&db).await;

   let result = sqlx::query("INSERT INTO items (name) VALUES ('nope')")
      .execute(db.read_pool().unwrap())
      .await;

   let err = result.unwrap_err();
   assert!(
      err.to_string().contains("readonly"),
      "unexpected error: {err}"
   );
}

#[tokio::test]
async fn test_reader_sees_committed_write() {
   let (db, _temp) = setup_store(None).await;
   create_items_table(&db).await;

   let mut writer = db.acquire_writer().await.unwrap();
   sqlx::query("INSERT INTO items (name) VALUES ('Alice')")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   let mut reader = db.acquire_reader().await.unwrap();
   let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM items")
      .fetch_all(&mut *reader)
      .await
      .unwrap();

   assert_eq!(names, vec![("Alice".to_string(),)]);
}

#[tokio::test]
async fn test_uncommitted_write_invisible_to_reader() {
   let (db, _temp) = setup_store(None).await;
   create_items_table(&db).await;

   let mut writer = db.acquire_writer().await.unwrap();
   sqlx::query("BEGIN").execute(&mut *writer).await.unwrap();
   sqlx::query("INSERT INTO items (name) VALUES ('pending')")
      .execute(&mut *writer)
      .await
      .unwrap();

   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
      .fetch_one(db.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(count, 0);

   sqlx::query("COMMIT").execute(&mut *writer).await.unwrap();
   drop(writer);

   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
      .fetch_one(db.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(count, 1);
}

#[tokio::test]
async fn test_writer_is_exclusive() {
   let (db, _temp) = setup_store(None).await;

   let writer = db.acquire_writer().await.unwrap();

   let blocked = timeout(Duration::from_millis(100), db.acquire_writer()).await;
   assert!(blocked.is_err(), "second writer must wait for the first");

   drop(writer);

   let second = timeout(Duration::from_secs(1), db.acquire_writer()).await;
   assert!(second.is_ok(), "writer is available once the guard drops");
}

#[tokio::test]
async fn test_dropped_guard_rolls_back_tracked_transaction() {
   let config = StoreConfig {
      journal_mode: JournalMode::Delete,
      ..Default::default()
   };
   let (db, _temp) = setup_store(Some(config)).await;
   create_items_table(&db).await;

   {
      let mut writer = db.acquire_writer().await.unwrap();
      writer.begin("BEGIN IMMEDIATE").await.unwrap();
      sqlx::query("INSERT INTO items (name) VALUES ('lost')")
         .execute(&mut *writer)
         .await
         .unwrap();
      assert!(writer.in_transaction());
   }

   // Without the rollback the RESERVED lock would still be held here
   let mut writer = db.acquire_writer().await.unwrap();
   assert!(!writer.in_transaction());
   writer.begin("BEGIN IMMEDIATE").await.unwrap();
   sqlx::query("INSERT INTO items (name) VALUES ('kept')")
      .execute(&mut *writer)
      .await
      .unwrap();
   writer.commit().await.unwrap();
   drop(writer);

   let names: Vec<String> = sqlx::query_scalar("SELECT name FROM items")
      .fetch_all(db.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(names, vec!["kept".to_string()]);
}

#[tokio::test]
async fn test_failed_begin_is_not_tracked() {
   let (db, _temp) = setup_store(None).await;

   let mut writer = db.acquire_writer().await.unwrap();
   assert!(writer.begin("BEGIN NONSENSE").await.is_err());
   assert!(!writer.in_transaction());

   writer.begin("BEGIN IMMEDIATE").await.unwrap();
   writer.rollback().await.unwrap();
   assert!(!writer.in_transaction());
}

#[tokio::test]
async fn test_wal_applied_on_connect() {
   let (db, _temp) = setup_store(None).await;

   let mut writer = db.acquire_writer().await.unwrap();
   let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
      .fetch_one(&mut *writer)
      .await
      .unwrap();

   assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_rollback_journal_mode() {
   let config = StoreConfig {
      journal_mode: JournalMode::Delete,
      ..Default::default()
   };
   let (db, _temp) = setup_store(Some(config)).await;
   create_items_table(&db).await;

   let mut writer = db.acquire_writer().await.unwrap();
   let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
      .fetch_one(&mut *writer)
      .await
      .unwrap();
   assert_eq!(mode.to_lowercase(), "delete");

   sqlx::query("INSERT INTO items (name) VALUES ('Bob')")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   let name: String = sqlx::query_scalar("SELECT name FROM items")
      .fetch_one(db.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(name, "Bob");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_close_rejects_further_use() {
   let (db, _temp) = setup_store(None).await;

   db.close().await.unwrap();

   assert!(db.is_closed());
   assert!(matches!(db.read_pool(), Err(Error::DatabaseClosed)));
   assert!(matches!(db.acquire_writer().await, Err(Error::DatabaseClosed)));

   // Closing twice is fine
   db.close().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_after_close_opens_new_store() {
   let (db, temp) = setup_store(None).await;
   create_items_table(&db).await;
   db.close().await.unwrap();

   let reopened = SqliteStore::connect(temp.path().join("store.db"), None)
      .await
      .unwrap();
   assert!(!Arc::ptr_eq(&db, &reopened));

   // Schema written before the close survives
   let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
      .fetch_one(reopened.read_pool().unwrap())
      .await
      .unwrap();
   assert_eq!(count, 0);
}

#[tokio::test]
async fn test_remove_deletes_files() {
   let (db, temp) = setup_store(None).await;
   create_items_table(&db).await;

   db.remove().await.unwrap();

   assert!(db.is_closed());
   assert!(!temp.path().join("store.db").exists());
   assert!(!temp.path().join("store.db-wal").exists());
   assert!(!temp.path().join("store.db-shm").exists());
}
