use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cycler::RequestCycler;
use crate::dispatcher::Dispatcher;

/// Launches fixed-size batches of dispatches with a pacing delay between
/// launches, and waits for the whole batch before returning.
pub struct BatchScheduler {
    dispatcher: Arc<Dispatcher>,
    cycler: RequestCycler,
    size: u32,
    intra_delay: Duration,
}

impl BatchScheduler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        cycler: RequestCycler,
        size: u32,
        intra_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            cycler,
            size,
            intra_delay,
        }
    }

    /// Runs one batch. Dispatch i is always launched before dispatch i+1;
    /// launched dispatches run concurrently. When `cancel` fires mid-batch
    /// no further dispatches are launched, but everything already in flight
    /// is still awaited so the batch never leaks tasks.
    ///
    /// The batch-complete event is only emitted for a batch that ran to
    /// completion, not for one cut short by cancellation.
    pub async fn run_batch(&mut self, cancel: &CancellationToken) {
        let mut handles = Vec::with_capacity(self.size as usize);

        for _ in 0..self.size {
            if cancel.is_cancelled() {
                break;
            }

            // The cursor advances here, on the scheduler's own task, so it
            // has exactly one writer.
            let spec = self.cycler.next();
            let dispatcher = self.dispatcher.clone();
            let dispatch_cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.dispatch(spec, dispatch_cancel).await;
            }));

            if !self.intra_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(self.intra_delay) => {}
                }
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        if !cancel.is_cancelled() {
            info!(batch_size = self.size, "batch complete");
        }
    }
}
