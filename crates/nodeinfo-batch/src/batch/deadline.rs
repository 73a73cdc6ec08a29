//! The cancellation budget shared by every stage of one batch.

use core::{fmt, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Deadline`] fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cause {
    /// The batch budget ran out.
    DeadlineExceeded,
    /// The owner of the batch cancelled it early (interrupt, fatal error).
    Cancelled,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A cloneable handle combining a [`CancellationToken`] with the instant the
/// batch budget expires.
///
/// Pipeline stages only observe it. The token fires when the timer started by
/// [`Deadline::after`] elapses, or when the batch owner calls
/// [`Deadline::cancel`].
#[derive(Clone, Debug)]
pub struct Deadline {
    token: CancellationToken,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Starts a budget of `timeout` from now.
    ///
    /// Spawns a timer task, so it must be called from within a Tokio runtime.
    /// The timer exits early if the deadline is cancelled first.
    pub fn after(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let expires_at = Instant::now() + timeout;

        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep_until(expires_at) => {
                    tracing::debug!("batch deadline exceeded");
                    timer.cancel();
                }
                () = timer.cancelled() => {}
            }
        });

        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// A deadline that only fires on an explicit [`Deadline::cancel`].
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
            expires_at: None,
        }
    }

    /// The token handed to each operation call.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the deadline has fired.
    pub async fn expired(&self) {
        self.token.cancelled().await;
    }

    /// Time left in the budget, or `None` for a deadline without a timer.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Why the deadline fired. Only meaningful once [`Deadline::is_expired`]
    /// returns `true`.
    pub fn cause(&self) -> Cause {
        match self.expires_at {
            Some(at) if Instant::now() >= at => Cause::DeadlineExceeded,
            _ => Cause::Cancelled,
        }
    }

    /// Fires the deadline early. Reserved for the owner of the batch.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fires_after_timeout() {
        let deadline = Deadline::after(Duration::from_millis(20));
        assert!(!deadline.is_expired());

        tokio::time::timeout(Duration::from_secs(2), deadline.expired())
            .await
            .unwrap();

        assert!(deadline.is_expired());
        assert_eq!(deadline.cause(), Cause::DeadlineExceeded);
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn explicit_cancel_is_visible_to_clones() {
        let deadline = Deadline::after(Duration::from_secs(60));
        let observer = deadline.clone();

        deadline.cancel();

        assert!(observer.is_expired());
        assert!(observer.token().is_cancelled());
        assert_eq!(observer.cause(), Cause::Cancelled);
    }

    #[test]
    fn never_has_no_budget() {
        let deadline = Deadline::never();
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), None);
    }
}
