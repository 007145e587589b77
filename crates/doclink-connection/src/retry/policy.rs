//! Retry policy evaluation

use std::time::Duration;
use tokio::time::Instant;

/// Counters the retry policy decides on
///
/// A counter is only maintained while its limit is active: with
/// `max_attempts == 0` the attempt count stays at zero, and with a zero retry
/// window `last_success_at` keeps its initial anchor. Neither is reliable
/// telemetry when its limit is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt_count: u32,
    last_success_at: Instant,
}

impl RetryState {
    /// Create a state whose retry window is anchored at `anchor`
    pub fn new(anchor: Instant) -> Self {
        Self {
            attempt_count: 0,
            last_success_at: anchor,
        }
    }

    /// Failed attempts since the last success
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Anchor of the retry window
    pub fn last_success_at(&self) -> Instant {
        self.last_success_at
    }
}

/// Rules governing whether another connect attempt is permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_forever: bool,
    max_attempts: u32,
    max_retry_window: Duration,
    retry_interval: Duration,
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Arguments
    ///
    /// * `retry_forever` - Retry without limit when both limits are zero
    /// * `max_attempts` - Attempt cap (0 = no attempt limit)
    /// * `max_retry_window` - Window after the last success (zero = no window limit)
    /// * `retry_interval` - Sleep between attempts
    pub fn new(
        retry_forever: bool,
        max_attempts: u32,
        max_retry_window: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            retry_forever,
            max_attempts,
            max_retry_window,
            retry_interval,
        }
    }

    pub fn retry_forever(&self) -> bool {
        self.retry_forever
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_retry_window(&self) -> Duration {
        self.max_retry_window
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Whether neither an attempt cap nor a retry window is configured
    pub fn is_unlimited(&self) -> bool {
        self.max_attempts == 0 && self.max_retry_window.is_zero()
    }

    /// Decide whether another attempt is permitted at `now`.
    ///
    /// The attempt cap and the retry window are OR-ed: satisfying either keeps
    /// the loop alive. With neither configured the answer is `retry_forever`,
    /// so the default configuration fails fast.
    pub fn can_retry(&self, state: &RetryState, now: Instant) -> bool {
        if self.is_unlimited() {
            return self.retry_forever;
        }

        let within_attempts = self.max_attempts > 0 && state.attempt_count < self.max_attempts;
        let within_window = !self.max_retry_window.is_zero()
            && match state.last_success_at.checked_add(self.max_retry_window) {
                Some(deadline) => now < deadline,
                // Past the representable horizon
                None => true,
            };

        within_attempts || within_window
    }

    /// Count one failed attempt
    pub fn record_failure(&self, state: &mut RetryState) {
        if self.max_attempts > 0 {
            state.attempt_count = state.attempt_count.saturating_add(1);
        }
    }

    /// Reset the counters after a successful connect at `now`
    pub fn record_success(&self, state: &mut RetryState, now: Instant) {
        if self.max_attempts > 0 {
            state.attempt_count = 0;
        }
        if !self.max_retry_window.is_zero() {
            state.last_success_at = now;
        }
    }
}
