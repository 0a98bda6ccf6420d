//! Elapsed-time counter in a fixed tick unit.

use std::sync::Arc;

use super::{Clock, Nanos};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Tracks time elapsed since creation, in ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    clock: Arc<dyn Clock>,
    start: Nanos,
    ticks_per_second: u64,
}

impl Ticker {
    /// Starts a ticker on the given clock.
    ///
    /// # Panics
    ///
    /// Panics if `ticks_per_second` is zero.
    pub fn new(ticks_per_second: u64, clock: Arc<dyn Clock>) -> Self {
        assert!(ticks_per_second > 0, "ticker: ticks_per_second must be positive");
        let start = clock.now();
        Self {
            clock,
            start,
            ticks_per_second,
        }
    }

    /// Clock time at which the ticker was started.
    pub fn start(&self) -> Nanos {
        self.start
    }

    /// Ticks elapsed since the ticker was started.
    pub fn elapsed(&self) -> u64 {
        let nanos = self.clock.now().saturating_sub(self.start);
        let ticks = u128::from(nanos) * u128::from(self.ticks_per_second) / NANOS_PER_SEC;
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Absolute clock time of the given tick position.
    pub fn tick_to_nanos(&self, tick: u64) -> Nanos {
        let nanos = u128::from(tick) * NANOS_PER_SEC / u128::from(self.ticks_per_second);
        self.start
            .saturating_add(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    #[test]
    fn test_ticker_counts_from_creation() {
        let clock = ManualClock::new();
        clock.set(1_000);
        let ticker = Ticker::new(1_000_000_000, Arc::new(clock.clone()));

        assert_eq!(ticker.elapsed(), 0);
        clock.advance_nanos(250);
        assert_eq!(ticker.elapsed(), 250);
        assert_eq!(ticker.start(), 1_000);
    }

    #[test]
    fn test_ticker_scales_to_tick_unit() {
        let clock = ManualClock::new();
        let ticker = Ticker::new(1_000, Arc::new(clock.clone())); // milliseconds

        clock.advance_nanos(2_999_999);
        assert_eq!(ticker.elapsed(), 2);
        assert_eq!(ticker.tick_to_nanos(3), 3_000_000);
    }

    #[test]
    #[should_panic(expected = "ticks_per_second must be positive")]
    fn test_ticker_rejects_zero_rate() {
        let _ = Ticker::new(0, Arc::new(ManualClock::new()));
    }
}
