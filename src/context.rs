//! Cancellation and deadline scope for one logical operation.
//!
//! Every public operation takes a [`Context`]. The retry controller and the
//! convergence poller check it at each loop boundary and race their sleeps
//! against it, so a cancelled or expired context aborts promptly with
//! [`Error::Cancelled`] or [`Error::DeadlineExceeded`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Cancellation token plus an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context driven by an externally owned cancellation token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Bound the context to finish within `timeout` from now.
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// unbounded.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Bound the context to an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// The token backing this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Sleep for `duration` unless the context ends first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(sleep(duration)).await
    }

    /// Drive `fut` to completion unless the context ends first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        self.check()?;
        let expiry = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = expiry => Err(Error::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}
