//! Error types for NodeInfo requests.
//!
//! ## Error Cases
//! - `NoProtocolSupport`: the host answered discovery with a 4xx status.
//! - `RemoteServer`: the host answered with a 5xx status.
//! - `InvalidUrl`: a hostname or href could not be turned into a request URL.
//! - `Http`: transport failure, including the client's own timeout.
//! - `Decode`: the response body was not the expected JSON document.
//! - `Cancelled`: the caller's cancellation token fired mid-request.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for NodeInfo requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The protocol says a client should abandon discovery on a 400 or 404
    /// and may mark the host as not supporting NodeInfo.
    #[error("host does not support NodeInfo protocol, status_code={status}")]
    NoProtocolSupport { status: u16 },

    /// The protocol says a client should retry discovery later on a 500.
    #[error("remote server error, client should retry later, status_code={status}")]
    RemoteServer { status: u16 },

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NoProtocolSupport { status } | Self::RemoteServer { status } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
