//! Caller-supplied operation context.
//!
//! Every handler takes an [`OpContext`] and checks it before each remote
//! call. A call that has already started runs to completion; the context only
//! stops the next one from being issued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Interrupted;

/// Deadline and cancellation state for one operation.
///
/// Clones share the cancellation flag, so a clone handed to another task can
/// cancel the original.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl OpContext {
    /// A context with no deadline that is never cancelled unless asked to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now. A timeout too large to represent as an
    /// instant leaves the context without a deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Check whether the next remote call may be issued.
    pub fn checkpoint(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupted::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_passes() {
        assert_eq!(OpContext::new().checkpoint(), Ok(()));
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = OpContext::new();
        let handle = ctx.clone();
        handle.cancel();

        assert_eq!(ctx.checkpoint(), Err(Interrupted::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let past = Instant::now()
            .checked_sub(Duration::from_millis(1))
            .unwrap_or_else(Instant::now);
        let ctx = OpContext::with_deadline(past);
        assert_eq!(ctx.checkpoint(), Err(Interrupted::DeadlineExceeded));
    }

    #[test]
    fn test_future_deadline_passes() {
        let ctx = OpContext::with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.checkpoint(), Ok(()));
    }

    #[test]
    fn test_huge_timeout_has_no_deadline() {
        let ctx = OpContext::with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.checkpoint(), Ok(()));
    }
}
