//! Fan-in of the per-worker output queues.

use super::{
    BatchResult, Deadline,
    diagnostics::{AbandonLog, Abandoned},
};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

/// Merges `inputs` into one queue of `capacity`.
///
/// One forwarding task per input moves results across. A finalization task
/// holds the first sender until every forwarder has returned, so the
/// merged queue closes exactly when all inputs are exhausted or abandoned.
pub(crate) fn merge<P: Send + 'static>(
    inputs: Vec<mpsc::Receiver<BatchResult<P>>>,
    capacity: usize,
    deadline: Deadline,
    log: Arc<AbandonLog>,
) -> mpsc::Receiver<BatchResult<P>> {
    let (tx, rx) = mpsc::channel(capacity);

    let forwarders: Vec<JoinHandle<usize>> = inputs
        .into_iter()
        .enumerate()
        .map(|(worker_id, input)| {
            tokio::spawn(forward(
                worker_id,
                input,
                tx.clone(),
                deadline.clone(),
                Arc::clone(&log),
            ))
        })
        .collect();

    tokio::spawn(async move {
        let mut forwarded = 0;
        for joined in futures::future::join_all(forwarders).await {
            match joined {
                Ok(n) => forwarded += n,
                Err(e) => tracing::error!("forwarder task failed: {e}"),
            }
        }
        tracing::debug!(forwarded, "collector finished");
        drop(tx);
    });

    rx
}

/// Moves results from one worker's queue to the merged queue.
///
/// While waiting for room in the merged queue the forwarder also watches the
/// deadline. If the deadline wins, the result in hand and anything still
/// buffered are reported as dropped and the worker's queue is closed.
async fn forward<P>(
    worker_id: usize,
    mut input: mpsc::Receiver<BatchResult<P>>,
    out: mpsc::Sender<BatchResult<P>>,
    deadline: Deadline,
    log: Arc<AbandonLog>,
) -> usize {
    let mut forwarded = 0;

    while let Some(result) = input.recv().await {
        tokio::select! {
            biased;
            permit = out.reserve() => match permit {
                Ok(permit) => {
                    permit.send(result);
                    forwarded += 1;
                }
                Err(_) => {
                    log.report(&result.id, Abandoned::ResultDropped);
                    abandon_rest(&mut input, &log).await;
                    break;
                }
            },
            () = deadline.expired() => {
                tracing::debug!(worker_id, "forwarder stopped by deadline");
                log.report(&result.id, Abandoned::ResultDropped);
                abandon_rest(&mut input, &log).await;
                break;
            }
        }
    }

    forwarded
}

async fn abandon_rest<P>(input: &mut mpsc::Receiver<BatchResult<P>>, log: &AbandonLog) {
    input.close();
    while let Some(result) = input.recv().await {
        log.report(&result.id, Abandoned::ResultDropped);
    }
}
