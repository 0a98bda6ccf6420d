//! Fixed-period admission gate.

use std::sync::Arc;
use std::time::Duration;

use super::{Clock, MonotonicClock, Nanos, Ticker};

const TICKS_PER_SECOND: u64 = 1_000_000_000;

/// Admits at most one event per period window.
///
/// The next admission threshold is always recomputed from the current
/// elapsed time, so after a long pause [`allow()`](Self::allow) succeeds
/// exactly once and the limiter lands back on the `k * period` grid.
///
/// # Example
///
/// ```
/// use stream_sender::time::{ManualClock, RateLimiter};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut limiter = RateLimiter::with_clock(Duration::from_secs(1), Arc::new(clock.clone()));
///
/// assert!(limiter.allow());
/// assert!(!limiter.allow());
///
/// clock.advance(Duration::from_secs(10));
/// assert!(limiter.allow());
/// assert!(!limiter.allow());
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    period: u64,
    pos: u64,
    ticker: Ticker,
}

impl RateLimiter {
    /// Creates a limiter on the process monotonic clock.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        Self::with_clock(period, Arc::new(MonotonicClock))
    }

    /// Creates a limiter on the given clock.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn with_clock(period: Duration, clock: Arc<dyn Clock>) -> Self {
        let period = u64::try_from(period.as_nanos()).unwrap_or(u64::MAX);
        assert!(
            period > 0,
            "rate limiter: expected positive period, got {period}"
        );
        Self {
            period,
            pos: 0,
            ticker: Ticker::new(TICKS_PER_SECOND, clock),
        }
    }

    /// Returns `true` if [`allow()`](Self::allow) would succeed now.
    pub fn would_allow(&self) -> bool {
        self.ticker.elapsed() >= self.pos
    }

    /// Admits an event if the current window has not had one yet.
    pub fn allow(&mut self) -> bool {
        let elapsed = self.ticker.elapsed();
        if elapsed < self.pos {
            return false;
        }
        self.pos = (elapsed / self.period + 1) * self.period;
        true
    }

    /// Clock time at which the next event will be admitted.
    pub fn next_deadline(&self) -> Nanos {
        self.ticker.tick_to_nanos(self.pos)
    }

    /// The admission period.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.period)
    }
}
