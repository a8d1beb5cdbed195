// Unit tests for the reconnect schedule consulted on keepalive ticks

use crate::config::ReconnectPolicy;
use crate::connection::reconnect::ReconnectSchedule;

use std::time::Duration;

use tokio::time::Instant;

fn backoff(initial_interval_ms: u64, max_interval_ms: u64) -> ReconnectSchedule {
    ReconnectSchedule::new(ReconnectPolicy::ExponentialBackoff {
        initial_interval_ms,
        max_interval_ms,
    })
}

/// **VALUE**: Verifies the default policy allows a reconnect on every tick.
///
/// **WHY THIS MATTERS**: The pad should come back within one keepalive interval of the server
/// returning, however long it was gone.
///
/// **BUG THIS CATCHES**: Would catch the fixed policy accumulating delay after failures.
#[test]
fn given_fixed_policy_when_attempts_fail_then_every_tick_may_reconnect() {
    let mut schedule = ReconnectSchedule::new(ReconnectPolicy::Fixed);
    let now = Instant::now();

    for _ in 0..10 {
        assert!(schedule.should_attempt(now));
        schedule.attempt_started(now);
    }
    assert!(schedule.should_attempt(now));
}

/// **VALUE**: Verifies the backoff policy defers the next attempt by at least the randomized
/// initial interval and allows it once that has passed.
///
/// **BUG THIS CATCHES**: Would catch the delay never being applied, or being applied forever.
#[test]
fn given_backoff_policy_when_attempt_started_then_next_attempt_deferred() {
    // GIVEN: Backoff starting at 1s with the default 0.5 randomization (0.5s..1.5s)
    let mut schedule = backoff(1000, 60_000);
    let now = Instant::now();
    assert!(schedule.should_attempt(now));

    // WHEN: An attempt starts
    schedule.attempt_started(now);

    // THEN: A tick right away is skipped, one after the longest possible delay is not
    assert!(!schedule.should_attempt(now));
    assert!(!schedule.should_attempt(now + Duration::from_millis(400)));
    assert!(schedule.should_attempt(now + Duration::from_millis(1600)));
}

/// **VALUE**: Verifies a successful connection resets the backoff.
///
/// **WHY THIS MATTERS**: A drop after an hour of good connection should retry quickly, not
/// resume from the delay reached during the previous outage.
///
/// **BUG THIS CATCHES**: Would catch `connection_opened` forgetting to reset the backoff.
#[test]
fn given_grown_backoff_when_connection_opened_then_schedule_reset() {
    let mut schedule = backoff(100, 10_000);
    let now = Instant::now();
    for _ in 0..8 {
        schedule.attempt_started(now);
    }
    assert!(!schedule.should_attempt(now + Duration::from_millis(200)));

    schedule.connection_opened();

    assert!(schedule.should_attempt(now));
    schedule.attempt_started(now);
    assert!(schedule.should_attempt(now + Duration::from_millis(200)));
}
