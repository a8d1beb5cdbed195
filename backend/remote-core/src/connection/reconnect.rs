use crate::config::ReconnectPolicy;

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tokio::time::Instant;

/// Decides whether a keepalive tick that finds no connection may reconnect.
///
/// The fixed policy always says yes. The backoff policy pushes the next allowed
/// attempt further out after every attempt and starts over once a socket opens.
pub(crate) struct ReconnectSchedule {
    backoff: Option<ExponentialBackoff>,
    not_before: Option<Instant>,
}

impl ReconnectSchedule {
    pub(crate) fn new(policy: ReconnectPolicy) -> Self {
        let backoff = match policy {
            ReconnectPolicy::Fixed => None,
            ReconnectPolicy::ExponentialBackoff {
                initial_interval_ms,
                max_interval_ms,
            } => Some(ExponentialBackoff {
                initial_interval: Duration::from_millis(initial_interval_ms),
                current_interval: Duration::from_millis(initial_interval_ms),
                max_interval: Duration::from_millis(max_interval_ms),
                max_elapsed_time: None,
                ..Default::default()
            }),
        };

        Self {
            backoff,
            not_before: None,
        }
    }

    pub(crate) fn should_attempt(&self, now: Instant) -> bool {
        self.not_before.is_none_or(|not_before| now >= not_before)
    }

    pub(crate) fn attempt_started(&mut self, now: Instant) {
        if let Some(backoff) = self.backoff.as_mut() {
            let delay = backoff.next_backoff().unwrap_or(backoff.max_interval);
            self.not_before = Some(now + delay);
        }
    }

    pub(crate) fn connection_opened(&mut self) {
        if let Some(backoff) = self.backoff.as_mut() {
            backoff.reset();
        }
        self.not_before = None;
    }
}
