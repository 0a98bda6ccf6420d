//! Saturating multi-source mixer.
//!
//! The mixer pulls one frame from every registered input and sums them
//! sample by sample into the caller's frame, clamping every addition to
//! [`SAMPLE_MIN`, `SAMPLE_MAX`]. Work is done in chunks no larger than a
//! scratch buffer allocated at construction, so reads never allocate.

use std::fmt;
use std::time::Duration;

use crate::buffer::{BufferFactory, SampleBuffer};
use crate::format::SampleSpec;
use crate::frame::saturating_add;
use crate::source::FrameReader;
use crate::{Frame, FrameFlags, MixerError, Sample};

/// Handle to an input registered with a [`Mixer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(u64);

/// Mixes any number of frame sources into one output stream.
///
/// # Merge Strategy
///
/// Inputs are summed, not averaged, and each addition saturates. A source
/// whose read fails for a chunk contributes silence for that chunk. The
/// output flags are the union of the flags of every source that produced
/// data.
///
/// With exactly one input the mixer is a pass-through: the input reads
/// straight into the caller's frame and its samples and flags are kept
/// as-is.
///
/// # Example
///
/// ```
/// use stream_sender::{Frame, FrameReader, HeapBufferFactory, Mixer, MockSource};
/// use stream_sender::format::SampleSpec;
/// use std::time::Duration;
///
/// let spec = SampleSpec::new(1000, 1);
/// let factory = HeapBufferFactory::new(64);
/// let mut mixer = Mixer::new(&factory, Duration::from_millis(4), spec)?;
///
/// mixer.add_input(Box::new(MockSource::from_samples(spec, &[0.25; 4])));
/// mixer.add_input(Box::new(MockSource::from_samples(spec, &[0.5; 4])));
///
/// let mut storage = [0.0f32; 4];
/// assert!(mixer.read(&mut Frame::new(&mut storage)));
/// assert_eq!(storage, [0.75; 4]);
/// # Ok::<(), stream_sender::MixerError>(())
/// ```
pub struct Mixer {
    inputs: Vec<(InputId, Box<dyn FrameReader>)>,
    next_id: u64,
    scratch: SampleBuffer,
}

impl Mixer {
    /// Creates a mixer whose chunk size is one frame of `frame_length`.
    ///
    /// # Errors
    ///
    /// Fails if the frame size in samples is zero, if `buffer_factory`
    /// can't produce a buffer, or if the buffer is smaller than one frame.
    pub fn new(
        buffer_factory: &dyn BufferFactory,
        frame_length: Duration,
        sample_spec: SampleSpec,
    ) -> Result<Self, MixerError> {
        let frame_size = sample_spec.ns_to_samples_overall(frame_length);
        tracing::debug!(frame_size, "mixer: initializing");

        if frame_size == 0 {
            tracing::error!(?frame_length, "mixer: frame size cannot be 0");
            return Err(MixerError::ZeroFrameSize { frame_length });
        }

        let Some(mut scratch) = buffer_factory.new_buffer() else {
            tracing::error!("mixer: can't allocate temporary buffer");
            return Err(MixerError::BufferUnavailable);
        };

        if scratch.capacity() < frame_size {
            tracing::error!(
                capacity = scratch.capacity(),
                frame_size,
                "mixer: allocated buffer is too small"
            );
            return Err(MixerError::BufferTooSmall {
                capacity: scratch.capacity(),
                required: frame_size,
            });
        }
        scratch.reslice(frame_size);

        Ok(Self {
            inputs: Vec::new(),
            next_id: 0,
            scratch,
        })
    }

    /// Registers an input. Inputs are read in the order they were added.
    ///
    /// No deduplication is done.
    pub fn add_input(&mut self, reader: Box<dyn FrameReader>) -> InputId {
        let id = InputId(self.next_id);
        self.next_id += 1;
        self.inputs.push((id, reader));
        id
    }

    /// Unregisters an input and hands it back.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered with this mixer.
    pub fn remove_input(&mut self, id: InputId) -> Box<dyn FrameReader> {
        let Some(pos) = self.inputs.iter().position(|(input, _)| *input == id) else {
            panic!("mixer: can't remove input {id:?}, not registered");
        };
        self.inputs.remove(pos).1
    }

    /// Number of registered inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Maximum number of samples mixed per chunk.
    pub fn chunk_size(&self) -> usize {
        self.scratch.len()
    }

    /// Mixes one chunk of every input into `out`.
    fn mix_chunk(
        inputs: &mut [(InputId, Box<dyn FrameReader>)],
        scratch: &mut [Sample],
        out: &mut [Sample],
        flags: &mut FrameFlags,
    ) {
        assert!(!out.is_empty(), "mixer: empty chunk");
        assert!(
            out.len() <= scratch.len(),
            "mixer: chunk of {} samples exceeds scratch buffer of {}",
            out.len(),
            scratch.len()
        );

        out.fill(0.0);
        let temp = &mut scratch[..out.len()];

        for (_, reader) in inputs.iter_mut() {
            let mut temp_frame = Frame::new(&mut *temp);
            if !reader.read(&mut temp_frame) {
                continue;
            }

            for (dst, &src) in out.iter_mut().zip(temp_frame.samples()) {
                *dst = saturating_add(*dst, src);
            }
            *flags |= temp_frame.flags();
        }
    }
}

impl FrameReader for Mixer {
    /// Fills `frame` with the mix of all inputs. Always returns `true`.
    fn read(&mut self, frame: &mut Frame<'_>) -> bool {
        if let [(_, reader)] = self.inputs.as_mut_slice() {
            if !reader.read(frame) {
                frame.samples_mut().fill(0.0);
                frame.set_flags(FrameFlags::empty());
            }
            return true;
        }

        let max_read = self.scratch.len();
        let scratch = self.scratch.as_mut_slice();
        let mut flags = FrameFlags::empty();

        for chunk in frame.samples_mut().chunks_mut(max_read) {
            Self::mix_chunk(&mut self.inputs, scratch, chunk, &mut flags);
        }

        frame.set_flags(flags);
        true
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("inputs", &self.inputs.len())
            .field("chunk_size", &self.scratch.len())
            .finish_non_exhaustive()
    }
}
