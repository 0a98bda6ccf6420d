//! Destination slots.
//!
//! A slot is one downstream endpoint of a [`PipelineSink`](crate::PipelineSink):
//! its own encode/transmit pipeline plus its own maintenance schedule. The
//! sink only relies on the [`SlotPipeline`] contract; what a slot does in
//! [`update()`](SlotPipeline::update) is up to the slot.
//!
//! - [`RingSlot`]: forwards frames as 16-bit PCM into a lock-free queue

mod ring;

pub use ring::RingSlot;

use std::fmt;
use std::sync::Arc;

use crate::buffer::BufferFactory;
use crate::format::SampleSpec;
use crate::time::{Clock, Nanos};
use crate::{Frame, SlotError};

/// Stable handle to a slot within one [`PipelineSink`](crate::PipelineSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Position of the slot in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// A destination's pipeline as seen by the sink.
///
/// # Implementation Notes
///
/// - `write` receives every frame the fan-out distributes; it must not block
/// - `update` performs periodic maintenance, whatever that means for the slot
/// - `update_deadline` returns the clock time at which `update` should run
///   next, or `None` if nothing is pending
/// - once a deadline is due, `update` must move it forward or clear it;
///   otherwise the scheduler keeps calling `update` without sleeping
pub trait SlotPipeline: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Consumes one frame from the fan-out.
    fn write(&mut self, frame: &Frame<'_>);

    /// Performs pending maintenance.
    fn update(&mut self);

    /// Next time maintenance is due, or `None`.
    fn update_deadline(&self) -> Option<Nanos>;
}

/// Shared resources handed to a slot when it is created.
#[derive(Debug, Clone)]
pub struct SlotContext {
    /// Handle the new slot will be registered under.
    pub id: SlotId,
    /// Format of the frames the slot will receive.
    pub sample_spec: SampleSpec,
    /// Buffer source shared by every slot of the sink, for slots that stage
    /// frames in their own buffers. [`RingSlot`] copies into its queue and
    /// doesn't draw from it.
    pub buffer_factory: Arc<dyn BufferFactory>,
    /// Clock deadlines are measured on.
    pub clock: Arc<dyn Clock>,
}

/// Builds destination pipelines for new slots.
///
/// Implemented for any `FnMut(&SlotContext) -> Result<Box<dyn SlotPipeline>, SlotError>`.
pub trait SlotFactory: Send {
    /// Builds the pipeline for a new slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline can't be built. The sink stays
    /// usable and no slot is registered.
    fn new_slot(&mut self, ctx: &SlotContext) -> Result<Box<dyn SlotPipeline>, SlotError>;
}

impl<F> SlotFactory for F
where
    F: FnMut(&SlotContext) -> Result<Box<dyn SlotPipeline>, SlotError> + Send,
{
    fn new_slot(&mut self, ctx: &SlotContext) -> Result<Box<dyn SlotPipeline>, SlotError> {
        self(ctx)
    }
}

/// A registered slot.
pub(crate) struct Slot {
    pub(crate) id: SlotId,
    pub(crate) pipeline: Box<dyn SlotPipeline>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("name", &self.pipeline.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use crate::HeapBufferFactory;

    struct NullSlot;

    impl SlotPipeline for NullSlot {
        fn name(&self) -> &str {
            "null"
        }

        fn write(&mut self, _frame: &Frame<'_>) {}

        fn update(&mut self) {}

        fn update_deadline(&self) -> Option<Nanos> {
            None
        }
    }

    #[test]
    fn test_closure_is_slot_factory() {
        let mut built = 0;
        let mut factory = |ctx: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
            built += 1;
            assert_eq!(ctx.id, SlotId(3));
            Ok(Box::new(NullSlot))
        };

        let ctx = SlotContext {
            id: SlotId(3),
            sample_spec: SampleSpec::default(),
            buffer_factory: Arc::new(HeapBufferFactory::new(16)),
            clock: Arc::new(ManualClock::new()),
        };
        let slot = factory.new_slot(&ctx).unwrap();
        assert_eq!(slot.name(), "null");
        drop(factory);
        assert_eq!(built, 1);
    }

    #[test]
    fn test_slot_id_display() {
        assert_eq!(SlotId(2).to_string(), "slot-2");
        assert_eq!(SlotId(2).index(), 2);
    }
}
