//! Cancellation and deadline propagation for API calls.
//!
//! Every client operation takes a `&Context`. The request is raced against
//! [`Context::done`], so cancelling a context (or letting its deadline pass)
//! aborts the in-flight call and surfaces a [`ContextError`].

use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ContextError;

/// A cancellation signal and optional deadline shared by clones.
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] it was created with, and all its clones.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Cancels the associated context. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancelled: None,
            deadline: None,
        }
    }

    /// Returns a cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancelled: Some(rx),
            deadline: None,
        };
        (ctx, Canceller { tx })
    }

    /// Derives a context that expires after `timeout`.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that expires at `deadline`, or at the parent's
    /// deadline if that one is earlier.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context ended, or `None` while it is still live.
    ///
    /// Cancellation is reported ahead of an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes once the context is cancelled or its deadline passes.
    ///
    /// Never completes for [`Context::background`].
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            match self.cancelled.clone() {
                // A dropped canceller can no longer cancel.
                Some(mut rx) => match rx.wait_for(|cancelled| *cancelled).await {
                    Ok(_) => ContextError::Cancelled,
                    Err(_) => pending().await,
                },
                None => pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::sleep_until(deadline).await;
                    ContextError::DeadlineExceeded
                }
                None => pending().await,
            }
        };

        tokio::select! {
            biased;
            reason = cancelled => reason,
            reason = expired => reason,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
