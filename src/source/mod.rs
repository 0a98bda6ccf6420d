//! Frame sources.
//!
//! A [`FrameReader`] is anything that can fill a caller-supplied frame:
//! a capture queue, a decoder, another [`Mixer`](crate::Mixer).
//!
//! - [`MockSource`]: synthetic audio for tests and demos
//! - [`RingSource`]: consumer side of a lock-free 16-bit PCM queue

mod mock;
mod ring;

pub use mock::MockSource;
pub use ring::RingSource;

use crate::Frame;

/// A source of audio frames.
///
/// # Contract
///
/// - `true`: the whole frame was populated and its flags are valid
/// - `false`: no data was available; the caller treats the frame as silent
///
/// A `false` return is never an error. Implementations must not block.
///
/// # Example
///
/// ```
/// use stream_sender::{Frame, FrameFlags, FrameReader};
///
/// struct Dc(f32);
///
/// impl FrameReader for Dc {
///     fn read(&mut self, frame: &mut Frame<'_>) -> bool {
///         frame.samples_mut().fill(self.0);
///         frame.set_flags(FrameFlags::NONBLANK);
///         true
///     }
/// }
/// ```
pub trait FrameReader: Send {
    /// Fills `frame` completely, or returns `false` if no data is available.
    fn read(&mut self, frame: &mut Frame<'_>) -> bool;
}
