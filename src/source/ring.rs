//! Ring buffer consumer as a frame source.

use ringbuf::traits::{Consumer, Observer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::format::pcm16_to_sample;
use crate::source::FrameReader;
use crate::{Frame, FrameFlags};

/// Reads frames from a lock-free SPSC queue of 16-bit PCM.
///
/// The producer side can live on another thread (a capture callback, or a
/// [`RingSlot`](crate::RingSlot) feeding a second mixer). A read succeeds
/// only when a full frame is queued, so partial data is never mixed.
pub struct RingSource {
    consumer: HeapCons<i16>,
    samples_read: u64,
}

impl RingSource {
    /// Wraps an existing ring buffer consumer.
    pub fn new(consumer: HeapCons<i16>) -> Self {
        Self {
            consumer,
            samples_read: 0,
        }
    }

    /// Creates a ring buffer and returns its producer together with a
    /// source reading from it.
    pub fn with_capacity(capacity: usize) -> (HeapProd<i16>, Self) {
        let (producer, consumer) = HeapRb::<i16>::new(capacity).split();
        (producer, Self::new(consumer))
    }

    /// Returns the number of samples currently queued.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Total samples consumed so far.
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }
}

impl FrameReader for RingSource {
    fn read(&mut self, frame: &mut Frame<'_>) -> bool {
        let n = frame.num_samples();
        if self.consumer.occupied_len() < n {
            return false;
        }

        let mut nonblank = false;
        for (dst, pcm) in frame.samples_mut().iter_mut().zip(self.consumer.pop_iter()) {
            nonblank |= pcm != 0;
            *dst = pcm16_to_sample(pcm);
        }
        self.samples_read += n as u64;

        frame.set_flags(if nonblank {
            FrameFlags::NONBLANK
        } else {
            FrameFlags::empty()
        });
        true
    }
}
