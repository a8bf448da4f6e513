//! Process-wide registry of open stores, keyed by canonical path

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::database::SqliteStore;
use crate::error::{Error, Result};

type Stores = HashMap<PathBuf, Weak<SqliteStore>>;

fn registry() -> &'static Mutex<Stores> {
   static REGISTRY: OnceLock<Mutex<Stores>> = OnceLock::new();
   REGISTRY.get_or_init(Default::default)
}

/// Builds the registry key for a database path.
///
/// The file itself may not exist yet, so only the parent directory is
/// canonicalized. The parent must exist.
pub(crate) async fn registry_key(path: &Path) -> Result<PathBuf> {
   let file_name = path
      .file_name()
      .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;

   let parent = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
   };

   let parent = tokio::fs::canonicalize(parent).await?;
   Ok(parent.join(file_name))
}

/// Returns the live store registered under `key`, or opens and registers a new one.
///
/// The registry lock is held across `open` so concurrent connects to the same
/// path end up sharing one store.
pub(crate) async fn get_or_open<F, Fut>(key: PathBuf, open: F) -> Result<Arc<SqliteStore>>
where
   F: FnOnce(PathBuf) -> Fut,
   Fut: Future<Output = Result<Arc<SqliteStore>>>,
{
   let mut stores = registry().lock().await;

   if let Some(existing) = stores.get(&key).and_then(Weak::upgrade)
      && !existing.is_closed()
   {
      debug!("Reusing open database: {}", key.display());
      return Ok(existing);
   }

   let store = open(key.clone()).await?;

   stores.retain(|_, weak| weak.strong_count() > 0);
   stores.insert(key, Arc::downgrade(&store));

   Ok(store)
}

/// Removes `store` from the registry, leaving any newer store at the same path alone.
pub(crate) async fn unregister(store: &SqliteStore) {
   let mut stores = registry().lock().await;

   if let Some(weak) = stores.get(store.path())
      && std::ptr::eq(weak.as_ptr(), store)
   {
      stores.remove(store.path());
   }
}

/// Closes every store currently registered.
pub(crate) async fn close_all() {
   let open: Vec<Arc<SqliteStore>> = {
      let stores = registry().lock().await;
      stores.values().filter_map(Weak::upgrade).collect()
   };

   debug!("Closing {} registered database(s)", open.len());

   for store in open {
      if let Err(e) = store.close().await {
         warn!("Failed to close database {}: {}", store.path().display(), e);
      }
   }
}
