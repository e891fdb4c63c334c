//! Bounded conflict retry
//!
//! [`RetryingFacade`] turns retryable aborts into forward progress:
//!
//! - `Conflict` / `RowLocked`: wait the fixed delay, try again
//! - any other error: return it immediately, untouched
//! - success: return immediately
//!
//! Every loop is bounded by at least one of an attempt limit, a deadline, or
//! a [`CancellationToken`]; hitting a bound yields `RetryExhausted`.
//!
//! Attempts may run many times, so they must not carry side effects that
//! survive an abort.

use orderlock_core::{Error, ExhaustionCause, Result};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Retry policy for conflicting attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed wait between attempts, in milliseconds
    pub delay_ms: u64,
    /// Give up after this many attempts (`None` = no attempt limit)
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first attempt
    /// (`None` = no deadline)
    pub timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 50,
            max_attempts: None,
            timeout_ms: Some(30_000),
        }
    }
}

impl RetryConfig {
    /// Set the fixed wait between attempts
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Limit the number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set a deadline relative to the first attempt
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Remove the deadline; only an attempt limit or cancellation stops the loop
    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    /// Wait between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Deadline as a duration, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Check the policy is usable
    ///
    /// # Errors
    /// `InvalidInput` if `max_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidInput(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Cooperative cancellation signal shared between a caller and retry loops
///
/// Cancelling wakes any loop sleeping between attempts. An attempt already
/// running is not interrupted; the loop stops before the next one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<CancelState>,
}

impl CancellationToken {
    /// Create an uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this token
    pub fn cancel(&self) {
        *self.state.cancelled.lock() = true;
        self.state.wake.notify_all();
    }

    /// Check if cancellation was signalled
    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock()
    }

    /// Sleep for `timeout` unless cancelled first; returns true if cancelled
    pub fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.state.cancelled.lock();
        while !*cancelled {
            if self.state.wake.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        *cancelled
    }
}

/// Conflict-retry loop around a single transaction attempt
#[derive(Debug, Clone, Default)]
pub struct RetryingFacade {
    config: RetryConfig,
    cancel: CancellationToken,
}

impl RetryingFacade {
    /// Create a facade with its own cancellation token
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` as this facade's cancellation signal
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Retry policy
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Cancellation signal checked between attempts
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `attempt` until it succeeds, fails terminally, or a bound is hit
    ///
    /// `attempt` receives the 1-based attempt number.
    ///
    /// # Errors
    /// - any non-retryable error from `attempt`, unchanged
    /// - `RetryExhausted` when the attempt limit, deadline or cancellation stops the loop
    pub fn run<T, F>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let started = Instant::now();
        let deadline = self.config.timeout().map(|t| started + t);
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.exhausted(attempts, ExhaustionCause::Cancelled));
            }
            // The first attempt always runs; later ones only before the deadline.
            if attempts > 0 && deadline.map_or(false, |d| Instant::now() >= d) {
                return Err(self.exhausted(attempts, ExhaustionCause::Deadline));
            }

            attempts += 1;
            let err = match attempt(attempts) {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(attempts, "attempt succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            tracing::debug!(attempt = attempts, error = %err, "retryable conflict");

            if self.config.max_attempts.map_or(false, |max| attempts >= max) {
                return Err(self.exhausted(attempts, ExhaustionCause::MaxAttempts));
            }

            let mut wait = self.config.delay();
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.exhausted(attempts, ExhaustionCause::Deadline));
                }
                wait = wait.min(deadline - now);
            }

            if self.cancel.sleep(wait) {
                return Err(self.exhausted(attempts, ExhaustionCause::Cancelled));
            }
        }
    }

    fn exhausted(&self, attempts: u32, cause: ExhaustionCause) -> Error {
        tracing::warn!(attempts, cause = %cause, "retry loop gave up");
        Error::RetryExhausted { attempts, cause }
    }
}
