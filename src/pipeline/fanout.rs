//! Fan-out that replicates frames to every slot.

use crate::sink::FrameWriter;
use crate::slot::{Slot, SlotId, SlotPipeline};
use crate::Frame;

/// Owns the registered slots and hands each of them every frame.
///
/// Slots are kept in creation order and never removed, so a [`SlotId`] is
/// its index.
#[derive(Debug, Default)]
pub(crate) struct Fanout {
    slots: Vec<Slot>,
}

impl Fanout {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a slot pipeline.
    pub(crate) fn add(&mut self, id: SlotId, pipeline: Box<dyn SlotPipeline>) {
        debug_assert_eq!(id.index(), self.slots.len());
        self.slots.push(Slot { id, pipeline });
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&dyn SlotPipeline> {
        self.slots.get(id.index()).map(|slot| slot.pipeline.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut (dyn SlotPipeline + 'static)> {
        self.slots
            .get_mut(id.index())
            .map(|slot| slot.pipeline.as_mut())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.iter_mut()
    }
}

impl FrameWriter for Fanout {
    fn write(&mut self, frame: &mut Frame<'_>) {
        for slot in &mut self.slots {
            slot.pipeline.write(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Nanos;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSlot {
        samples: Arc<AtomicUsize>,
    }

    impl SlotPipeline for CountingSlot {
        fn name(&self) -> &str {
            "counting"
        }

        fn write(&mut self, frame: &Frame<'_>) {
            self.samples.fetch_add(frame.num_samples(), Ordering::SeqCst);
        }

        fn update(&mut self) {}

        fn update_deadline(&self) -> Option<Nanos> {
            None
        }
    }

    #[test]
    fn test_fanout_writes_to_all_slots() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut fanout = Fanout::new();
        fanout.add(SlotId(0), Box::new(CountingSlot { samples: first.clone() }));
        fanout.add(SlotId(1), Box::new(CountingSlot { samples: second.clone() }));

        let mut storage = [0.5, 0.25];
        fanout.write(&mut Frame::new(&mut storage));
        fanout.write(&mut Frame::new(&mut storage));

        assert_eq!(fanout.len(), 2);
        assert_eq!(first.load(Ordering::SeqCst), 4);
        assert_eq!(second.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_fanout_lookup_by_id() {
        let mut fanout = Fanout::new();
        fanout.add(
            SlotId(0),
            Box::new(CountingSlot {
                samples: Arc::default(),
            }),
        );

        assert_eq!(fanout.get(SlotId(0)).map(SlotPipeline::name), Some("counting"));
        assert!(fanout.get_mut(SlotId(0)).is_some());
        assert!(fanout.get(SlotId(1)).is_none());
        assert_eq!(fanout.iter().count(), 1);
    }

    #[test]
    fn test_fanout_with_no_slots_is_noop() {
        let mut fanout = Fanout::new();
        let mut storage = [0.5, 0.25];
        fanout.write(&mut Frame::new(&mut storage));
        assert_eq!(fanout.len(), 0);
    }
}
