//! Deadlines and cancellation for queries
//!
//! A [`Context`] is passed down from the caller into the transport. Child
//! contexts can only shorten the deadline, and cancelling through a
//! [`CancelHandle`] stops every clone of the context it was created with.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context stopped a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("context cancelled")]
    Cancelled,
}

/// Caller-supplied deadline and cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    // one receiver per with_cancel() in the ancestry
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// No deadline, never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that expires after `timeout`, or earlier if the parent does.
    ///
    /// A timeout too large to represent as an instant leaves the parent's
    /// deadline unchanged.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Child context that expires at `deadline`, or earlier if the parent does.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    /// Child context plus a handle that cancels it.
    ///
    /// Cancelling the parent still cancels the child.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut cancel = self.cancel.clone();
        cancel.push(rx);
        let child = Self {
            deadline: self.deadline,
            cancel,
        };
        (child, CancelHandle { tx })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }

    /// Run `fut` until it completes, the deadline passes or the context is cancelled.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        if self.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if deadline <= Instant::now() {
                return Err(ContextError::DeadlineExceeded);
            }
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            output = fut => Ok(output),
            _ = wait_any_cancelled(self.cancel.clone()) => Err(ContextError::Cancelled),
            _ = expired => Err(ContextError::DeadlineExceeded),
        }
    }
}

/// Resolves once any receiver sees cancellation. Receivers whose handle was
/// dropped never resolve.
fn wait_any_cancelled(
    mut receivers: Vec<watch::Receiver<bool>>,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let Some(rx) = receivers.pop() else {
            return std::future::pending::<()>().await;
        };
        tokio::select! {
            _ = cancelled(rx) => {}
            _ = wait_any_cancelled(receivers) => {}
        }
    })
}

async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
