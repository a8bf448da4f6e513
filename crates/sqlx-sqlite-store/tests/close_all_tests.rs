//! `close_all` touches the process-wide registry, so it lives in its own test binary.

use sqlx_sqlite_store::{Error, SqliteStore, close_all};
use tempfile::TempDir;

#[tokio::test]
async fn test_close_all_closes_every_store() {
   let temp = TempDir::new().unwrap();
   let first = SqliteStore::connect(temp.path().join("a.db"), None)
      .await
      .unwrap();
   let second = SqliteStore::connect(temp.path().join("b.db"), None)
      .await
      .unwrap();

   close_all().await;

   assert!(first.is_closed());
   assert!(second.is_closed());
   assert!(matches!(first.read_pool(), Err(Error::DatabaseClosed)));
}
