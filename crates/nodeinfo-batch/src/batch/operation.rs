use core::fmt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// The per-item capability a batch applies to every identifier.
///
/// The pipeline never looks inside the payload or the error: the payload is
/// serialized as-is into the result record, and the error is rendered with
/// [`fmt::Display`] into its `err` field.
///
/// The token is the batch deadline's token. Implementations may watch it to
/// give up early, but workers never abort a call in progress.
///
/// Any `Fn(CancellationToken, String) -> impl Future<Output = Result<P, E>>`
/// closure is an `Operation`.
pub trait Operation: Send + Sync + 'static {
    type Payload: Serialize + Default + Send + 'static;
    type Error: fmt::Display + Send + 'static;

    fn call(
        &self,
        token: CancellationToken,
        id: String,
    ) -> impl Future<Output = Result<Self::Payload, Self::Error>> + Send;
}

impl<F, Fut, P, E> Operation for F
where
    F: Fn(CancellationToken, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, E>> + Send,
    P: Serialize + Default + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Payload = P;
    type Error = E;

    fn call(
        &self,
        token: CancellationToken,
        id: String,
    ) -> impl Future<Output = Result<P, E>> + Send {
        self(token, id)
    }
}
