//! Time sources and periodic admission.
//!
//! All timestamps in this crate are [`Nanos`] read from a [`Clock`].
//! Update deadlines published by slots and aggregated by the pipeline sink
//! are absolute values on the same clock.

mod clock;
mod rate_limiter;
mod ticker;

pub use clock::{Clock, ManualClock, MonotonicClock, Nanos};
pub use rate_limiter::RateLimiter;
pub use ticker::Ticker;
