//! # Interrupt
//!
//! Cooperative cancellation and deadline checks. The job runner keeps a
//! clone and flips the flag; the evaluator polls between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::EvalError;

/// Shared cancellation flag with an optional deadline.
///
/// ## Example
///
/// ```rust
/// use openscad_eval::Interrupt;
///
/// let interrupt = Interrupt::new();
/// let handle = interrupt.clone();
/// assert!(interrupt.check().is_ok());
/// handle.cancel();
/// assert!(interrupt.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same flag, expiring `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Same flag, expiring at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail with `Cancelled` or `TimedOut` when evaluation must stop.
    #[inline]
    pub fn check(&self) -> Result<(), EvalError> {
        if self.is_cancelled() {
            return Err(EvalError::cancelled());
        }
        if self.is_expired() {
            return Err(EvalError::timed_out());
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalErrorKind;

    #[test]
    fn test_cancel_is_shared() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        clone.cancel();
        clone.cancel();
        assert!(interrupt.is_cancelled());
        assert_eq!(interrupt.check().unwrap_err().kind, EvalErrorKind::Cancelled);
    }

    #[test]
    fn test_expired_deadline() {
        let interrupt = Interrupt::new().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(interrupt.check().unwrap_err().kind, EvalErrorKind::TimedOut);
    }

    #[test]
    fn test_cancel_wins_over_timeout() {
        let interrupt = Interrupt::new().with_deadline(Instant::now() - Duration::from_millis(1));
        interrupt.cancel();
        assert_eq!(interrupt.check().unwrap_err().kind, EvalErrorKind::Cancelled);
    }

    #[test]
    fn test_future_deadline_passes() {
        let interrupt = Interrupt::new().with_timeout(Duration::from_secs(60));
        assert!(interrupt.check().is_ok());
    }
}
