//! Audio frame view with status flags.

/// A single audio amplitude.
pub type Sample = f32;

/// Lowest representable sample value.
pub const SAMPLE_MIN: Sample = -1.0;

/// Highest representable sample value.
pub const SAMPLE_MAX: Sample = 1.0;

bitflags::bitflags! {
    /// Status flags attached to a frame.
    ///
    /// Flags from several sources are combined with bitwise OR when frames
    /// are mixed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u32 {
        /// The frame carries at least one non-silent sample.
        const NONBLANK = 1 << 0;
        /// Part of the frame was filled with silence because data was missing.
        const INCOMPLETE = 1 << 1;
        /// Data was dropped while producing the frame.
        const DROPS = 1 << 2;
    }
}

/// A borrowed view of audio samples plus status flags.
///
/// `Frame` never owns its storage. The caller supplies the sample slice for
/// the duration of one `read` or `write` call, which keeps the hot path free
/// of allocation.
///
/// # Example
///
/// ```
/// use stream_sender::{Frame, FrameFlags};
///
/// let mut storage = [0.0f32; 4];
/// let mut frame = Frame::new(&mut storage);
/// frame.samples_mut()[0] = 0.5;
/// frame.set_flags(FrameFlags::NONBLANK);
///
/// assert_eq!(frame.num_samples(), 4);
/// assert!(frame.flags().contains(FrameFlags::NONBLANK));
/// ```
#[derive(Debug)]
pub struct Frame<'a> {
    samples: &'a mut [Sample],
    flags: FrameFlags,
}

impl<'a> Frame<'a> {
    /// Creates a frame over the given samples with no flags set.
    pub fn new(samples: &'a mut [Sample]) -> Self {
        Self {
            samples,
            flags: FrameFlags::empty(),
        }
    }

    /// Creates a frame over the given samples with the given flags.
    pub fn with_flags(samples: &'a mut [Sample], flags: FrameFlags) -> Self {
        Self { samples, flags }
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[Sample] {
        &*self.samples
    }

    /// Returns the samples for writing.
    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut *self.samples
    }

    /// Returns the number of samples across all channels.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if this frame has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the status flags.
    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    /// Replaces the status flags.
    pub fn set_flags(&mut self, flags: FrameFlags) {
        self.flags = flags;
    }

    /// Adds flags to the current set.
    pub fn add_flags(&mut self, flags: FrameFlags) {
        self.flags |= flags;
    }
}

/// Adds two samples, saturating at [`SAMPLE_MIN`] and [`SAMPLE_MAX`].
#[inline]
pub fn saturating_add(a: Sample, b: Sample) -> Sample {
    (a + b).clamp(SAMPLE_MIN, SAMPLE_MAX)
}
