use crate::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Reads `input` to the end and returns one identifier per line, in order.
///
/// Line terminators (`\n` or `\r\n`) are stripped and the last line need not
/// be terminated. Blank lines are kept as empty identifiers.
///
/// # Errors
///
/// [`Error::Read`] on any I/O failure before end of input, including invalid
/// UTF-8.
pub async fn read_identifiers<R: AsyncRead + Unpin>(input: R) -> Result<Vec<String>> {
    let mut lines = BufReader::new(input).lines();
    let mut ids = Vec::new();

    while let Some(line) = lines.next_line().await.map_err(Error::Read)? {
        ids.push(line);
    }

    Ok(ids)
}
