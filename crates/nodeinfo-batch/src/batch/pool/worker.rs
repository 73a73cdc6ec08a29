use super::manager::WorkQueue;
use crate::batch::{
    BatchResult, Deadline, Operation,
    diagnostics::{AbandonLog, Abandoned},
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One worker's lifecycle.
///
/// Repeatedly takes the next identifier from the shared queue, checks the
/// deadline, runs the operation and pushes the result onto `out`. Exits when:
/// - the queue is closed and empty,
/// - the deadline has fired by the time an identifier is taken (that
///   identifier is reported, not run),
/// - `out` was closed by the collector (the undeliverable result is
///   reported).
///
/// `out` is dropped on exit, which closes this worker's output queue.
pub(crate) async fn worker_loop<O: Operation>(
    worker_id: usize,
    queue: WorkQueue,
    out: mpsc::Sender<BatchResult<O::Payload>>,
    operation: Arc<O>,
    deadline: Deadline,
    log: Arc<AbandonLog>,
) {
    tracing::trace!(worker_id, "worker started");
    let mut completed = 0_usize;

    loop {
        // Hold the lock only while waiting for the next item.
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };

        let Some(id) = next else {
            break;
        };

        if deadline.is_expired() {
            log.report(&id, Abandoned::Undispatched(deadline.cause()));
            break;
        }

        let outcome = operation.call(deadline.token().clone(), id.clone()).await;
        let result = BatchResult::from_outcome(id, outcome);

        if let Err(mpsc::error::SendError(result)) = out.send(result).await {
            log.report(&result.id, Abandoned::ResultDropped);
            break;
        }
        completed += 1;
    }

    tracing::trace!(worker_id, completed, "worker stopped");
}
