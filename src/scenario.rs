use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlx_sqlite_handle::StoreConfig;
use tokio::task::{AbortHandle, JoinHandle};

use crate::Result;
use crate::variant::Variant;
use crate::wait_group::{Pending, WaitGroup};

/// Boxed body of a scenario run.
pub type ScenarioFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A verification the [`Runner`](crate::Runner) can execute once per enabled variant.
pub trait Scenario: Send + Sync {
   /// Name of the suite the scenario reports under.
   fn suite(&self) -> &str;

   fn description(&self) -> &str;

   /// Build the scenario body for one run.
   ///
   /// Operations started by the body should be tracked with
   /// [`ScenarioContext::dispatch`]; the run completes once the body returns
   /// and every dispatched operation has settled. Background work should be
   /// started with [`ScenarioContext::spawn`] so it ends with the run.
   fn run(&self, ctx: ScenarioContext) -> ScenarioFuture;
}

/// Everything a scenario run needs from the runner.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
   variant: Variant,
   location: PathBuf,
   store_config: StoreConfig,
   wait_group: WaitGroup,
   tasks: ScenarioTasks,
}

impl ScenarioContext {
   pub fn new(
      variant: Variant,
      location: PathBuf,
      store_config: StoreConfig,
      wait_group: WaitGroup,
   ) -> Self {
      Self {
         variant,
         location,
         store_config,
         wait_group,
         tasks: ScenarioTasks::default(),
      }
   }

   pub fn variant(&self) -> Variant {
      self.variant
   }

   pub fn location(&self) -> &Path {
      &self.location
   }

   pub fn store_config(&self) -> &StoreConfig {
      &self.store_config
   }

   /// Store name this run should use for `base`.
   pub fn store_name(&self, base: &str) -> String {
      self.variant.store_name(base)
   }

   pub fn dispatch(&self) -> Pending {
      self.wait_group.dispatch()
   }

   pub fn wait_group(&self) -> &WaitGroup {
      &self.wait_group
   }

   /// Spawn background work that is aborted when the run ends.
   pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
   where
      F: Future + Send + 'static,
      F::Output: Send + 'static,
   {
      self.tasks.spawn(future)
   }

   pub fn tasks(&self) -> &ScenarioTasks {
      &self.tasks
   }
}

/// Abort handles of the tasks a scenario run spawned.
#[derive(Debug, Clone, Default)]
pub struct ScenarioTasks {
   handles: Arc<Mutex<Vec<AbortHandle>>>,
}

impl ScenarioTasks {
   pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
   where
      F: Future + Send + 'static,
      F::Output: Send + 'static,
   {
      let handle = tokio::spawn(future);
      self.lock().push(handle.abort_handle());
      handle
   }

   /// Abort every task spawned so far. Returns how many were still running.
   pub fn abort_all(&self) -> usize {
      let handles = std::mem::take(&mut *self.lock());
      handles
         .iter()
         .filter(|handle| !handle.is_finished())
         .inspect(|handle| handle.abort())
         .count()
   }

   fn lock(&self) -> MutexGuard<'_, Vec<AbortHandle>> {
      self.handles.lock().unwrap_or_else(PoisonError::into_inner)
   }
}
