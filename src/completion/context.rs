//! Per-call cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::CompletionError;

/// Cancellation signal plus optional wall-clock deadline for one call.
///
/// Cloning shares the token: cancelling any clone cancels them all.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CallContext {
    /// Context whose deadline is `timeout` from now. A zero timeout means
    /// no deadline.
    pub fn new(timeout: Duration, token: CancellationToken) -> Self {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        Self { deadline, token }
    }

    /// Context with no deadline and a fresh token.
    #[cfg(test)]
    pub fn background() -> Self {
        Self::new(Duration::ZERO, CancellationToken::new())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fails if the call was cancelled or its deadline has passed.
    ///
    /// Cancellation is reported before an expired deadline.
    pub fn check(&self) -> Result<(), CompletionError> {
        if self.token.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CompletionError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the call is cancelled or the deadline passes.
    pub async fn done(&self) -> CompletionError {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => CompletionError::Cancelled,
            _ = sleep_until_deadline(self.deadline) => CompletionError::DeadlineExceeded,
        }
    }

    /// Runs `fut` unless the call is cancelled or times out first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, CompletionError> {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
