//! Spawning and teardown of the batch worker pool.
//!
//! This module defines [`WorkerPool`], which starts a fixed number of Tokio
//! workers that all take from the same work queue. A single
//! [`mpsc::Receiver`] is shared behind an async mutex so that whichever worker
//! is idle takes the next identifier.
//!
//! Each worker owns a private bounded output queue. The pool hands those
//! receivers to the collector and keeps only a sweeper task, which waits for
//! every worker to end and then reports whatever is still queued.

use super::worker::worker_loop;
use crate::batch::{
    BatchResult, Deadline, Operation,
    diagnostics::{AbandonLog, Abandoned},
};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

/// The shared work queue, taken from by every worker.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// A running pool: one output queue per worker plus the sweeper handle.
pub struct WorkerPool<P> {
    outputs: Vec<mpsc::Receiver<BatchResult<P>>>,
    sweeper: JoinHandle<()>,
}

impl<P: Send + 'static> WorkerPool<P> {
    /// Spawns `num_workers` workers over `queue`, each with an output queue
    /// of `capacity`.
    pub(crate) fn spawn<O>(
        num_workers: usize,
        capacity: usize,
        queue: mpsc::Receiver<String>,
        operation: Arc<O>,
        deadline: Deadline,
        log: Arc<AbandonLog>,
    ) -> Self
    where
        O: Operation<Payload = P>,
    {
        let queue: WorkQueue = Arc::new(Mutex::new(queue));
        let mut outputs = Vec::with_capacity(num_workers);
        let mut workers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(capacity);
            outputs.push(rx);

            workers.push(tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&queue),
                tx,
                Arc::clone(&operation),
                deadline.clone(),
                Arc::clone(&log),
            )));
        }

        let sweeper = tokio::spawn(sweep(workers, queue, deadline, log));

        Self { outputs, sweeper }
    }

    /// Splits the pool into the per-worker output queues and the sweeper.
    pub fn into_parts(self) -> (Vec<mpsc::Receiver<BatchResult<P>>>, JoinHandle<()>) {
        (self.outputs, self.sweeper)
    }
}

/// Waits for every worker to end, then drains the shared queue until the
/// distributor closes it, reporting each leftover identifier.
///
/// Without cancellation workers only end once the queue is closed and empty,
/// so nothing is left to report. Draining also keeps the distributor from
/// waiting forever on a queue nobody takes from.
async fn sweep(
    workers: Vec<JoinHandle<()>>,
    queue: WorkQueue,
    deadline: Deadline,
    log: Arc<AbandonLog>,
) {
    for (worker_id, joined) in futures::future::join_all(workers)
        .await
        .into_iter()
        .enumerate()
    {
        if let Err(e) = joined {
            tracing::error!(worker_id, "worker task failed: {e}");
        }
    }

    let reason = if deadline.is_expired() {
        Abandoned::Undispatched(deadline.cause())
    } else {
        Abandoned::Stranded
    };

    let mut rx = queue.lock().await;
    let mut swept = 0_usize;
    while let Some(id) = rx.recv().await {
        log.report(&id, reason);
        swept += 1;
    }

    tracing::debug!(swept, "worker pool drained");
}
