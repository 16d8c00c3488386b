//! Cancellation and deadlines for a running search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{HriError, Result};

/// Shared flag; cloning gives another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct SearchControl {
    token: CancellationToken,
    started: Instant,
    timeout: Option<Duration>,
}

impl Default for SearchControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchControl {
    /// No deadline, fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            started: Instant::now(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Deadline measured from when the control was created.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fail if cancelled or past the deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(HriError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = self.started.elapsed();
            if elapsed >= timeout {
                return Err(HriError::DeadlineExceeded(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_control_passes() {
        assert!(SearchControl::new().check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let control = SearchControl::new().with_token(token.clone());
        token.cancel();
        assert!(matches!(control.check(), Err(HriError::Cancelled)));
    }

    #[test]
    fn test_zero_timeout_expires() {
        let control = SearchControl::new().with_timeout(Duration::ZERO);
        assert!(matches!(control.check(), Err(HriError::DeadlineExceeded(0))));
    }
}
