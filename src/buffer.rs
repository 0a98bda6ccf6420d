//! Pre-allocated sample buffers.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::frame::Sample;

/// A fixed-capacity, reusable block of samples.
///
/// The storage is allocated once. [`reslice()`](Self::reslice) changes the
/// usable extent within that capacity and never reallocates.
pub struct SampleBuffer {
    data: Box<[Sample]>,
    len: usize,
    live: Option<Arc<AtomicUsize>>,
}

impl SampleBuffer {
    /// Allocates a zeroed buffer whose usable extent equals its capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity].into_boxed_slice(),
            len: capacity,
            live: None,
        }
    }

    /// Total number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current usable extent.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the usable extent is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets the usable extent to `len` samples.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity.
    pub fn reslice(&mut self, len: usize) {
        assert!(
            len <= self.capacity(),
            "buffer: can't reslice to {len} samples, capacity is {}",
            self.capacity()
        );
        self.len = len;
    }

    /// The usable samples.
    pub fn as_slice(&self) -> &[Sample] {
        &self.data[..self.len]
    }

    /// The usable samples, for writing.
    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.data[..self.len]
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for SampleBuffer {
    fn drop(&mut self) {
        if let Some(live) = &self.live {
            live.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Produces sample buffers on demand.
///
/// Returning `None` means no buffer is available; callers treat this as a
/// construction failure.
pub trait BufferFactory: Send + Sync + fmt::Debug {
    /// Produces a new buffer, or `None` if none can be provided.
    fn new_buffer(&self) -> Option<SampleBuffer>;
}

/// Heap-backed factory producing buffers of one fixed size.
///
/// # Example
///
/// ```
/// use stream_sender::{BufferFactory, HeapBufferFactory};
///
/// let factory = HeapBufferFactory::with_limit(1024, 1);
/// let first = factory.new_buffer();
/// assert!(first.is_some());
/// assert!(factory.new_buffer().is_none()); // limit reached
///
/// drop(first);
/// assert!(factory.new_buffer().is_some());
/// ```
#[derive(Debug)]
pub struct HeapBufferFactory {
    buffer_size: usize,
    max_buffers: Option<usize>,
    live: Arc<AtomicUsize>,
}

impl HeapBufferFactory {
    /// Creates an unbounded factory.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            max_buffers: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a factory that allows at most `max_buffers` live buffers.
    pub fn with_limit(buffer_size: usize, max_buffers: usize) -> Self {
        Self {
            max_buffers: Some(max_buffers),
            ..Self::new(buffer_size)
        }
    }

    /// Capacity of every buffer produced.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl BufferFactory for HeapBufferFactory {
    fn new_buffer(&self) -> Option<SampleBuffer> {
        let reserved = self
            .live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| match self.max_buffers {
                Some(max) if live >= max => None,
                _ => Some(live + 1),
            });

        if reserved.is_err() {
            tracing::debug!(
                max_buffers = ?self.max_buffers,
                "buffer factory: limit reached"
            );
            return None;
        }

        let mut buffer = SampleBuffer::new(self.buffer_size);
        buffer.live = Some(Arc::clone(&self.live));
        Some(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zeroed_and_full() {
        let buf = SampleBuffer::new(16);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.len(), 16);
        assert!(buf.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_reslice_narrows_usable_extent() {
        let mut buf = SampleBuffer::new(16);
        buf.reslice(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.as_mut_slice().len(), 4);
    }

    #[test]
    #[should_panic(expected = "can't reslice")]
    fn test_reslice_beyond_capacity_is_fatal() {
        let mut buf = SampleBuffer::new(4);
        buf.reslice(5);
    }

    #[test]
    fn test_factory_tracks_live_buffers() {
        let factory = HeapBufferFactory::new(8);
        let a = factory.new_buffer().unwrap();
        let b = factory.new_buffer().unwrap();
        assert_eq!(factory.live_buffers(), 2);
        assert_eq!(a.capacity(), 8);

        drop(a);
        drop(b);
        assert_eq!(factory.live_buffers(), 0);
    }

    #[test]
    fn test_factory_limit() {
        let factory = HeapBufferFactory::with_limit(8, 2);
        let _a = factory.new_buffer().unwrap();
        let _b = factory.new_buffer().unwrap();
        assert!(factory.new_buffer().is_none());
        assert_eq!(factory.live_buffers(), 2);
    }

    #[test]
    fn test_zero_limit_never_produces() {
        let factory = HeapBufferFactory::with_limit(8, 0);
        assert!(factory.new_buffer().is_none());
    }
}
