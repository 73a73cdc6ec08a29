use super::{BatchResult, RecordFields};
use crate::{Error, Result};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_stream::{Stream, StreamExt};

/// Writes each result as one JSON line to `sink`, in arrival order, until
/// `results` ends. Returns the number of records written.
///
/// # Errors
///
/// Stops at the first [`Error::Serialization`] or [`Error::Write`]; results
/// still queued behind it are not consumed.
pub async fn emit<P, S, W>(mut results: S, fields: RecordFields, mut sink: W) -> Result<usize>
where
    P: Serialize,
    S: Stream<Item = BatchResult<P>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut emitted = 0;

    while let Some(result) = results.next().await {
        let mut line = result
            .to_record(fields)
            .map_err(|source| Error::Serialization {
                id: result.id.clone(),
                source,
            })?;
        line.push(b'\n');

        sink.write_all(&line).await.map_err(Error::Write)?;
        emitted += 1;
    }

    sink.flush().await.map_err(Error::Write)?;
    Ok(emitted)
}
