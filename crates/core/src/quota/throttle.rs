//! Advisory record of remote throttling
//!
//! The remote service answering 429 despite local admission means the local
//! quotas and the service disagree. This monitor only records it: the count
//! and whether the last 429 falls within a fixed window. It never blocks or
//! rejects a call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tallyline_common::resilience::{Clock, SystemClock};
use tallyline_domain::constants::REMOTE_THROTTLE_WINDOW_SECS;
use tallyline_domain::RealmId;
use tracing::warn;

pub struct RemoteThrottleMonitor<C: Clock = SystemClock> {
    window: Duration,
    clock: C,
    last_throttled: Mutex<Option<Instant>>,
    total: AtomicU64,
}

impl Default for RemoteThrottleMonitor<SystemClock> {
    fn default() -> Self {
        Self::with_clock(Duration::from_secs(REMOTE_THROTTLE_WINDOW_SECS), SystemClock)
    }
}

impl<C: Clock> RemoteThrottleMonitor<C> {
    pub const fn with_clock(window: Duration, clock: C) -> Self {
        Self { window, clock, last_throttled: Mutex::new(None), total: AtomicU64::new(0) }
    }

    /// Note a 429 from the remote service.
    pub fn record(&self, realm: &RealmId) {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_throttled.lock() = Some(self.clock.now());
        warn!(realm = %realm, total, "remote service rate limited a locally admitted call");
    }

    /// Whether the last 429 is within the window.
    pub fn is_cooling_down(&self) -> bool {
        self.last_throttled
            .lock()
            .is_some_and(|at| self.clock.now().saturating_duration_since(at) < self.window)
    }

    /// 429s seen since creation.
    pub fn total_throttled(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl<C: Clock> std::fmt::Debug for RemoteThrottleMonitor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteThrottleMonitor")
            .field("window", &self.window)
            .field("total", &self.total_throttled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tallyline_common::resilience::MockClock;

    use super::*;

    #[test]
    fn test_cool_down_window() {
        let clock = MockClock::new();
        let monitor = RemoteThrottleMonitor::with_clock(Duration::from_secs(60), clock.clone());
        assert!(!monitor.is_cooling_down());

        monitor.record(&RealmId::new("1").unwrap());
        assert!(monitor.is_cooling_down());
        assert_eq!(monitor.total_throttled(), 1);

        clock.advance(Duration::from_secs(59));
        assert!(monitor.is_cooling_down());
        clock.advance(Duration::from_secs(1));
        assert!(!monitor.is_cooling_down());
        assert_eq!(monitor.total_throttled(), 1);
    }
}
