//! The bounded-concurrency batch pipeline.
//!
//! [`run_batch`] wires the stages together:
//!
//! 1. [`read_identifiers`] reads the whole input.
//! 2. A distributor task offers each identifier to one shared work queue.
//! 3. A [`WorkerPool`] of `N` workers takes from that queue and runs the
//!    [`Operation`], each pushing to its own output queue.
//! 4. The collector forwards every output queue into one merged queue.
//! 5. [`emit`] writes the merged results as JSON lines.
//!
//! Stages talk only through `tokio::sync::mpsc` queues and a shared
//! [`Deadline`]. Once the deadline fires no new identifier is dispatched, and
//! every identifier without a result record is reported to [`Diagnostics`].

mod collector;
mod deadline;
mod diagnostics;
mod distributor;
mod emitter;
mod input;
mod operation;
mod pool;
mod result;

#[cfg(test)]
mod tests;

pub use deadline::{Cause, Deadline};
pub use diagnostics::{
    Abandoned, Diagnostics, LineDiagnostics, MemoryDiagnostics, StderrDiagnostics,
};
pub use emitter::emit;
pub use input::read_identifiers;
pub use operation::Operation;
pub use pool::WorkerPool;
pub use result::{BatchResult, RecordFields};

use crate::{Error, Result};
use diagnostics::AbandonLog;
use std::sync::Arc;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::mpsc,
};
use tokio_stream::wrappers::ReceiverStream;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 64;

/// Default capacity of every queue in the pipeline.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Sizing of the worker pool and its queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// # Errors
    ///
    /// [`Error::Config`] if either value is zero.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::config("workers must be greater than 0"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queue capacity must be greater than 0"));
        }
        Ok(())
    }
}

/// Lifecycle of one batch run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Sequencing,
    DistributingAndWorking,
    Collecting,
    Draining,
    Done,
    Failed,
}

/// Counts reported by a finished batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    /// Identifiers read from the input.
    pub inputs: usize,
    /// Result records written.
    pub emitted: usize,
    /// Identifiers reported to diagnostics instead.
    pub abandoned: usize,
    pub state: RunState,
}

struct StateMachine(RunState);

impl StateMachine {
    fn advance(&mut self, next: RunState) {
        tracing::debug!(from = ?self.0, to = ?next, "batch state");
        self.0 = next;
    }
}

/// Runs `operation` over every identifier in `input` and writes one JSON
/// record per result to `output`.
///
/// The run ends once the merged result queue is exhausted and the pool has
/// swept any leftover identifiers, so the returned summary accounts for all
/// of them: without cancellation `emitted == inputs`.
///
/// # Errors
///
/// - [`Error::Config`] if `pool` is invalid.
/// - [`Error::Read`] if the input fails; nothing is written.
/// - [`Error::Serialization`] or [`Error::Write`] if emission fails. The
///   deadline is then cancelled so in-flight work winds down.
pub async fn run_batch<O, R, W>(
    pool: &PoolConfig,
    fields: RecordFields,
    deadline: &Deadline,
    input: R,
    output: W,
    operation: O,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<BatchSummary>
where
    O: Operation,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pool.validate()?;
    let mut state = StateMachine(RunState::Idle);

    state.advance(RunState::Sequencing);
    let ids = match read_identifiers(input).await {
        Ok(ids) => ids,
        Err(e) => {
            state.advance(RunState::Failed);
            return Err(e);
        }
    };
    let inputs = ids.len();
    tracing::debug!(inputs, workers = pool.workers, "identifiers read");

    state.advance(RunState::DistributingAndWorking);
    let log = Arc::new(AbandonLog::new(diagnostics));
    let (work_tx, work_rx) = mpsc::channel(pool.queue_capacity);
    let distributor = distributor::spawn_distributor(ids, work_tx, Arc::clone(&log));
    let (outputs, sweeper) = WorkerPool::spawn(
        pool.workers,
        pool.queue_capacity,
        work_rx,
        Arc::new(operation),
        deadline.clone(),
        Arc::clone(&log),
    )
    .into_parts();

    state.advance(RunState::Collecting);
    let merged = collector::merge(
        outputs,
        pool.queue_capacity,
        deadline.clone(),
        Arc::clone(&log),
    );

    state.advance(RunState::Draining);
    let emitted = match emit(ReceiverStream::new(merged), fields, output).await {
        Ok(emitted) => emitted,
        Err(e) => {
            tracing::error!("aborting batch: {e}");
            deadline.cancel();
            state.advance(RunState::Failed);
            return Err(e);
        }
    };

    if let Err(e) = distributor.await {
        tracing::error!("distributor task failed: {e}");
    }
    if let Err(e) = sweeper.await {
        tracing::error!("sweeper task failed: {e}");
    }

    state.advance(RunState::Done);
    Ok(BatchSummary {
        inputs,
        emitted,
        abandoned: log.count(),
        state: state.0,
    })
}
