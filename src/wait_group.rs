//! Tracking of dispatched-but-unsettled operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counts outstanding operations for one scenario run.
///
/// Each [`WaitGroup::dispatch`] hands out a [`Pending`] ticket; the count
/// drops when the ticket settles, explicitly or on drop. [`WaitGroup::wait`]
/// resolves once the count reaches zero.
#[derive(Debug, Clone, Default)]
pub struct WaitGroup {
   inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
   outstanding: AtomicUsize,
   drained: Notify,
}

impl WaitGroup {
   pub fn new() -> Self {
      Self::default()
   }

   /// Record one more outstanding operation.
   pub fn dispatch(&self) -> Pending {
      self.inner.outstanding.fetch_add(1, Ordering::AcqRel);
      Pending {
         inner: Some(Arc::clone(&self.inner)),
      }
   }

   pub fn outstanding(&self) -> usize {
      self.inner.outstanding.load(Ordering::Acquire)
   }

   /// Wait until every dispatched operation has settled.
   pub async fn wait(&self) {
      loop {
         let notified = self.inner.drained.notified();
         tokio::pin!(notified);
         // Register before checking so a settle between the check and the
         // await is not missed
         notified.as_mut().enable();

         if self.outstanding() == 0 {
            return;
         }

         notified.await;
      }
   }
}

/// A dispatched operation. Settles exactly once.
#[derive(Debug)]
#[must_use = "dropping a Pending settles it immediately"]
pub struct Pending {
   inner: Option<Arc<Inner>>,
}

impl Pending {
   pub fn settle(mut self) {
      self.release();
   }

   fn release(&mut self) {
      if let Some(inner) = self.inner.take()
         && inner.outstanding.fetch_sub(1, Ordering::AcqRel) == 1
      {
         inner.drained.notify_waiters();
      }
   }
}

impl Drop for Pending {
   fn drop(&mut self) {
      self.release();
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use std::time::Duration;
   use tokio::time::timeout;

   #[tokio::test]
   async fn test_wait_on_empty_group_returns() {
      let group = WaitGroup::new();
      timeout(Duration::from_millis(100), group.wait())
         .await
         .expect("empty group must not block");
   }

   #[tokio::test]
   async fn test_settle_and_drop_each_count_once() {
      let group = WaitGroup::new();
      let a = group.dispatch();
      let b = group.dispatch();
      assert_eq!(group.outstanding(), 2);

      a.settle();
      assert_eq!(group.outstanding(), 1);

      drop(b);
      assert_eq!(group.outstanding(), 0);
   }

   #[tokio::test]
   async fn test_wait_blocks_until_last_settles() {
      let group = WaitGroup::new();
      let pending = group.dispatch();

      let waiter = {
         let group = group.clone();
         tokio::spawn(async move { group.wait().await })
      };

      tokio::time::sleep(Duration::from_millis(20)).await;
      assert!(!waiter.is_finished());

      pending.settle();
      timeout(Duration::from_secs(1), waiter)
         .await
         .expect("wait must resolve after settle")
         .unwrap();
   }

   #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
   async fn test_many_settles_across_tasks() {
      let group = WaitGroup::new();
      let mut tasks = Vec::new();

      for i in 0..32u64 {
         let pending = group.dispatch();
         tasks.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(i % 5)).await;
            pending.settle();
         }));
      }

      timeout(Duration::from_secs(2), group.wait()).await.unwrap();
      assert_eq!(group.outstanding(), 0);

      for task in tasks {
         task.await.unwrap();
      }
   }
}
