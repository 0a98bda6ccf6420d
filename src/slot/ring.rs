//! Slot that forwards frames into a lock-free PCM queue.

use std::time::Duration;

use ringbuf::traits::{Observer, Producer};
use ringbuf::HeapProd;

use crate::format::sample_to_pcm16;
use crate::slot::{SlotContext, SlotPipeline};
use crate::source::RingSource;
use crate::time::{Nanos, RateLimiter};
use crate::Frame;

/// A slot whose transmit pipeline is a 16-bit PCM ring buffer.
///
/// Writing converts and pushes samples without allocating; samples that
/// don't fit are dropped and counted. Maintenance is a status report
/// emitted once per `report_interval`, and the slot's update deadline is
/// the time of the next report.
///
/// # Example
///
/// ```ignore
/// let factory = move |ctx: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
///     let (slot, source) = RingSlot::new(ctx, 4096, Duration::from_secs(1));
///     sources.lock().push(source);
///     Ok(Box::new(slot))
/// };
/// let sink = PipelineSink::new(config, buffers, factory)?;
/// ```
pub struct RingSlot {
    name: String,
    producer: HeapProd<i16>,
    samples_written: u64,
    samples_dropped: u64,
    reporter: RateLimiter,
}

impl RingSlot {
    /// Creates a slot with a queue of `capacity` samples, returning the
    /// source that drains it.
    ///
    /// # Panics
    ///
    /// Panics if `report_interval` is zero.
    pub fn new(ctx: &SlotContext, capacity: usize, report_interval: Duration) -> (Self, RingSource) {
        let (producer, source) = RingSource::with_capacity(capacity);
        let slot = Self {
            name: format!("ring-{}", ctx.id.index()),
            producer,
            samples_written: 0,
            samples_dropped: 0,
            reporter: RateLimiter::with_clock(report_interval, ctx.clock.clone()),
        };
        (slot, source)
    }

    /// Total samples pushed into the queue.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Total samples dropped because the queue was full.
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped
    }
}

impl SlotPipeline for RingSlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, frame: &Frame<'_>) {
        let pushed = self
            .producer
            .push_iter(frame.samples().iter().map(|&s| sample_to_pcm16(s)));
        self.samples_written += pushed as u64;
        self.samples_dropped += (frame.num_samples() - pushed) as u64;
    }

    fn update(&mut self) {
        if !self.reporter.allow() {
            return;
        }
        tracing::debug!(
            slot = %self.name,
            queued = self.producer.occupied_len(),
            written = self.samples_written,
            dropped = self.samples_dropped,
            "ring slot: status"
        );
    }

    fn update_deadline(&self) -> Option<Nanos> {
        Some(self.reporter.next_deadline())
    }
}
