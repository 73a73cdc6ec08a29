use super::diagnostics::{AbandonLog, Abandoned};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};

/// Spawns the single producer that feeds the shared work queue.
///
/// Identifiers are offered in input order; each offer waits while the queue is
/// full. The queue closes when the task drops `queue` after the last offer.
/// Cancellation is not observed here: workers decline items themselves, and
/// the pool's sweeper drains whatever they leave behind.
///
/// Resolves to the number of identifiers accepted by the queue.
pub(crate) fn spawn_distributor(
    ids: Vec<String>,
    queue: mpsc::Sender<String>,
    log: Arc<AbandonLog>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut offered = 0;
        let mut ids = ids.into_iter();

        while let Some(id) = ids.next() {
            if let Err(mpsc::error::SendError(id)) = queue.send(id).await {
                // Only reachable if the pool went away without sweeping.
                tracing::warn!("work queue closed with identifiers left");
                log.report(&id, Abandoned::Stranded);
                for id in ids.by_ref() {
                    log.report(&id, Abandoned::Stranded);
                }
                break;
            }
            offered += 1;
        }

        tracing::debug!(offered, "distributor finished");
        offered
    })
}
