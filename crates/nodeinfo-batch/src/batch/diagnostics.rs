//! Reporting of identifiers that never produced a result record.

use super::deadline::Cause;
use core::fmt;
use parking_lot::Mutex;
use std::{
    io::{Stderr, Write},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Why an identifier has no result record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Abandoned {
    /// The deadline fired before a worker invoked the operation.
    Undispatched(Cause),
    /// Every worker exited without the deadline firing (a worker panicked),
    /// leaving the identifier in the shared queue.
    Stranded,
    /// The operation ran, but the collector had already stopped under
    /// cancellation so the result could not be delivered.
    ResultDropped,
}

impl fmt::Display for Abandoned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undispatched(cause) => write!(f, "{cause}"),
            Self::Stranded => f.write_str("no workers left"),
            Self::ResultDropped => f.write_str("result dropped"),
        }
    }
}

/// Sink for abandoned identifiers, kept apart from the result stream.
pub trait Diagnostics: Send + Sync + 'static {
    fn abandoned(&self, id: &str, reason: Abandoned);
}

/// Writes one `"<reason>; id=<identifier>"` line per report.
///
/// Write failures are ignored: a broken diagnostics stream must not stop the
/// batch.
#[derive(Debug)]
pub struct LineDiagnostics<W> {
    out: Mutex<W>,
}

/// The binary's sink.
pub type StderrDiagnostics = LineDiagnostics<Stderr>;

impl<W: Write> LineDiagnostics<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl Default for LineDiagnostics<Stderr> {
    fn default() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send + 'static> Diagnostics for LineDiagnostics<W> {
    fn abandoned(&self, id: &str, reason: Abandoned) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "{reason}; id={id}");
    }
}

/// Keeps every report in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    reports: Mutex<Vec<(String, Abandoned)>>,
}

impl MemoryDiagnostics {
    pub fn reports(&self) -> Vec<(String, Abandoned)> {
        self.reports.lock().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.reports.lock().iter().map(|(id, _)| id.clone()).collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn abandoned(&self, id: &str, reason: Abandoned) {
        self.reports.lock().push((id.to_owned(), reason));
    }
}

/// Counts reports on their way to the configured sink.
pub(crate) struct AbandonLog {
    sink: Arc<dyn Diagnostics>,
    count: AtomicUsize,
}

impl AbandonLog {
    pub(crate) fn new(sink: Arc<dyn Diagnostics>) -> Self {
        Self {
            sink,
            count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn report(&self, id: &str, reason: Abandoned) {
        self.count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(id, %reason, "abandoned");
        self.sink.abandoned(id, reason);
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}
