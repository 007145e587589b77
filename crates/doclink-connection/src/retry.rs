//! Connect retry policy
//!
//! [`RetryPolicy`] decides whether another connect attempt is permitted after
//! a failure; [`RetryState`] holds the counters it decides on. The state is
//! owned by the link and only touched from its connect loop.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use doclink_connection::retry::{RetryPolicy, RetryState};
//! use tokio::time::Instant;
//!
//! let policy = RetryPolicy::new(false, 3, Duration::ZERO, Duration::from_secs(5));
//! let now = Instant::now();
//! let mut state = RetryState::new(now);
//!
//! policy.record_failure(&mut state);
//! assert!(policy.can_retry(&state, now));
//! policy.record_failure(&mut state);
//! policy.record_failure(&mut state);
//! assert!(!policy.can_retry(&state, now));
//! ```

mod policy;

#[cfg(test)]
mod tests;

pub use policy::{RetryPolicy, RetryState};
