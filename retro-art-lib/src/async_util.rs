//! Drive an async operation while consuming its event channel.
//!
//! Library operations report progress over an unbounded channel and return a
//! final value. Frontends want both: every event rendered as it arrives, then
//! the final value once the channel is exhausted.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

/// Upper bound on draining events left in the channel after the task ends.
/// Senders held by detached tasks would otherwise keep the loop alive.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run `task` to completion, handing every event from `events` to `on_event`.
///
/// Events sent before the task returns are always delivered. The task's
/// output is returned once the channel closes or the drain timeout elapses.
pub async fn run_with_events<F, E, R>(
    task: F,
    mut events: mpsc::UnboundedReceiver<E>,
    mut on_event: impl FnMut(E),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(task);
    let mut delivered: u64 = 0;

    let output = loop {
        tokio::select! {
            r = &mut task => break Some(r),
            event = events.recv() => match event {
                Some(e) => {
                    delivered += 1;
                    on_event(e);
                }
                None => break None,
            },
        }
    };

    let Some(output) = output else {
        log::debug!("Event channel closed after {delivered} events, awaiting task");
        return task.await;
    };

    let deadline = Instant::now() + DRAIN_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(e)) => {
                delivered += 1;
                on_event(e);
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!(
                    "Stopped draining events after {}s; a sender is still alive",
                    DRAIN_TIMEOUT.as_secs()
                );
                break;
            }
        }
    }
    log::debug!("Delivered {delivered} events");
    output
}
