//! Bounded worker pool with cooperative cancellation.
//!
//! Items are admitted through a counting semaphore: at most N items are in
//! flight at any time, each on its own tokio task. Results arrive on an
//! unbounded channel in completion order, not submission order.
//!
//! Cancelling the pool's token (or dropping the pool) stops admission
//! immediately. In-flight items are abandoned at their next suspension point
//! and their results are discarded.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Hard safety-net timeout per work item. If a process_fn hangs beyond this,
/// the item is dropped without a result. Set far above any legitimate item
/// duration (network timeouts plus the full backoff schedule) so it only
/// fires as a last resort.
const SAFETY_TIMEOUT: Duration = Duration::from_secs(600);

/// A pool of worker tasks that process items concurrently.
///
/// # Example
///
/// ```ignore
/// let mut pool = WorkerPool::start(4, items, cancel.clone(), |item| async move {
///     process(item).await
/// });
///
/// while let Some(result) = pool.recv().await {
///     handle(result);
/// }
/// ```
pub struct WorkerPool<R: Send + 'static> {
    result_rx: mpsc::UnboundedReceiver<R>,
    cancel: CancellationToken,
    _submitter: JoinHandle<()>,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Admit `items` through a gate of `n` permits and return a pool for
    /// receiving results.
    ///
    /// The pool works on a child of `cancel`: cancelling the parent stops the
    /// pool, while [`cancel`](Self::cancel) or dropping the pool leaves the
    /// parent untouched.
    pub fn start<W, F, Fut>(n: usize, items: Vec<W>, cancel: CancellationToken, process_fn: F) -> Self
    where
        W: Send + 'static,
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let n = n.max(1);
        let cancel = cancel.child_token();
        let gate = Arc::new(Semaphore::new(n));
        let (result_tx, result_rx) = mpsc::unbounded_channel::<R>();
        let process_fn = Arc::new(process_fn);

        let submit_cancel = cancel.clone();
        let submitter = tokio::spawn(async move {
            for item in items {
                let permit = tokio::select! {
                    biased;
                    _ = submit_cancel.cancelled() => break,
                    permit = gate.clone().acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => break,
                    },
                };

                let result_tx = result_tx.clone();
                let process_fn = process_fn.clone();
                let cancel = submit_cancel.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        outcome = tokio::time::timeout(SAFETY_TIMEOUT, process_fn(item)) => match outcome {
                            Ok(r) => {
                                if !cancel.is_cancelled() {
                                    let _ = result_tx.send(r);
                                }
                            }
                            Err(_) => {
                                log::debug!(
                                    "Worker pool: item timed out after {}s, skipping",
                                    SAFETY_TIMEOUT.as_secs()
                                );
                            }
                        },
                    }
                });
            }
            // result_tx dropped here; the channel closes once the last worker finishes
        });

        Self {
            result_rx,
            cancel,
            _submitter: submitter,
        }
    }

    /// Receive the next result. Returns `None` when every admitted item has
    /// finished, or as soon as the pool is cancelled.
    pub async fn recv(&mut self) -> Option<R> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            r = self.result_rx.recv() => r,
        }
    }

    /// Stop admitting items and abandon the ones in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<R: Send + 'static> Drop for WorkerPool<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
