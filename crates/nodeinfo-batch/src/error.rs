//! Fatal errors for a batch run.
//!
//! Per-item failures never show up here: they are rendered into the `err`
//! field of that item's result record and the batch carries on. Each variant
//! below ends the whole run.
//!
//! ## Error Cases
//! - `Config`: timeouts or pool sizing rejected before any input is read.
//! - `Read`: the identifier stream failed before end of input.
//! - `Serialization`: a result could not be encoded as JSON.
//! - `Write`: the output sink rejected a record.

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("failed to read identifiers: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to encode result for {id:?}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
