use tokio::sync::oneshot;
use tracing::trace;

use crate::{Error, Result};

/// One-shot signal that a scenario finished, carrying its result.
///
/// [`Completion::signal`] consumes the signal, so a scenario can complete at
/// most once.
#[derive(Debug)]
pub struct Completion {
   tx: oneshot::Sender<Result<()>>,
}

/// Receiving side of a [`Completion`].
#[derive(Debug)]
pub struct CompletionReceiver {
   rx: oneshot::Receiver<Result<()>>,
}

impl Completion {
   pub fn channel() -> (Completion, CompletionReceiver) {
      let (tx, rx) = oneshot::channel();
      (Completion { tx }, CompletionReceiver { rx })
   }

   pub fn signal(self, result: Result<()>) {
      if self.tx.send(result).is_err() {
         // Receiver gave up, usually after a timeout
         trace!("completion signaled after the receiver was dropped");
      }
   }
}

impl CompletionReceiver {
   /// Wait for the signal.
   ///
   /// Returns [`Error::Abandoned`] if the [`Completion`] was dropped without
   /// signaling.
   pub async fn wait(self) -> Result<()> {
      self.rx.await.unwrap_or(Err(Error::Abandoned))
   }
}
