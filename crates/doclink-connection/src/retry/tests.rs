//! Tests for the retry module

use super::*;
use rstest::rstest;
use std::time::Duration;
use tokio::time::Instant;

const INTERVAL: Duration = Duration::from_secs(5);

fn policy(retry_forever: bool, max_attempts: u32, window: Duration) -> RetryPolicy {
    RetryPolicy::new(retry_forever, max_attempts, window, INTERVAL)
}

mod can_retry_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fail_fast_when_no_limit_is_set() {
        let policy = policy(false, 0, Duration::ZERO);
        let now = Instant::now();
        let mut state = RetryState::new(now);

        policy.record_failure(&mut state);
        assert!(!policy.can_retry(&state, now));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    fn test_attempt_cap_allows_exactly_n_attempts(#[case] n: u32) {
        let policy = policy(false, n, Duration::ZERO);
        let now = Instant::now();
        let mut state = RetryState::new(now);

        let mut attempts = 0;
        loop {
            attempts += 1;
            policy.record_failure(&mut state);
            if !policy.can_retry(&state, now) {
                break;
            }
        }
        assert_eq!(attempts, n);
        assert_eq!(state.attempt_count(), n);
    }

    #[test]
    fn test_window_ignores_attempt_count() {
        let policy = policy(false, 0, Duration::from_secs(60));
        let anchor = Instant::now();
        let mut state = RetryState::new(anchor);

        for _ in 0..1_000 {
            policy.record_failure(&mut state);
        }
        assert!(policy.can_retry(&state, anchor + Duration::from_secs(59)));
        assert!(!policy.can_retry(&state, anchor + Duration::from_secs(60)));
    }

    #[test]
    fn test_retry_forever_without_limits() {
        let policy = policy(true, 0, Duration::ZERO);
        let anchor = Instant::now();
        let mut state = RetryState::new(anchor);

        for _ in 0..100 {
            policy.record_failure(&mut state);
        }
        assert!(policy.can_retry(&state, anchor + Duration::from_secs(86_400)));
    }

    #[test]
    fn test_retry_forever_defers_to_configured_limits() {
        let policy = policy(true, 2, Duration::ZERO);
        let now = Instant::now();
        let mut state = RetryState::new(now);

        policy.record_failure(&mut state);
        policy.record_failure(&mut state);
        assert!(!policy.can_retry(&state, now));
    }

    #[test]
    fn test_limits_are_or_ed() {
        let policy = policy(false, 2, Duration::from_secs(60));
        let anchor = Instant::now();
        let mut state = RetryState::new(anchor);

        policy.record_failure(&mut state);
        policy.record_failure(&mut state);

        // Attempts exhausted, window still open
        assert!(policy.can_retry(&state, anchor + Duration::from_secs(30)));
        // Both exhausted
        assert!(!policy.can_retry(&state, anchor + Duration::from_secs(61)));

        // Window closed, attempts still available
        let mut fresh = RetryState::new(anchor);
        policy.record_failure(&mut fresh);
        assert!(policy.can_retry(&fresh, anchor + Duration::from_secs(120)));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let policy = policy(false, 0, Duration::MAX);
        let now = Instant::now();
        let state = RetryState::new(now);
        assert!(policy.can_retry(&state, now));
    }
}

mod record_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attempt_count_not_maintained_without_cap() {
        let policy = policy(false, 0, Duration::from_secs(60));
        let mut state = RetryState::new(Instant::now());

        policy.record_failure(&mut state);
        policy.record_failure(&mut state);
        assert_eq!(state.attempt_count(), 0);
    }

    #[test]
    fn test_success_resets_attempts() {
        let policy = policy(false, 3, Duration::ZERO);
        let anchor = Instant::now();
        let mut state = RetryState::new(anchor);

        policy.record_failure(&mut state);
        policy.record_failure(&mut state);
        policy.record_success(&mut state, anchor + Duration::from_secs(10));

        assert_eq!(state.attempt_count(), 0);
        // No window configured, so the anchor is left alone
        assert_eq!(state.last_success_at(), anchor);
    }

    #[test]
    fn test_success_moves_window_anchor() {
        let policy = policy(false, 0, Duration::from_secs(60));
        let anchor = Instant::now();
        let mut state = RetryState::new(anchor);

        let later = anchor + Duration::from_secs(600);
        assert!(!policy.can_retry(&state, later));

        policy.record_success(&mut state, later);
        assert_eq!(state.last_success_at(), later);
        assert!(policy.can_retry(&state, later + Duration::from_secs(1)));
    }

    #[test]
    fn test_policy_accessors() {
        let policy = RetryPolicy::new(true, 4, Duration::from_secs(90), Duration::from_secs(6));
        assert!(policy.retry_forever());
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.max_retry_window(), Duration::from_secs(90));
        assert_eq!(policy.retry_interval(), Duration::from_secs(6));
        assert!(!policy.is_unlimited());
    }
}
