//! Frame writers and the device-facing sink contract.
//!
//! A [`FrameWriter`] accepts fully populated frames. A [`Sink`] is a
//! frame writer that the host scheduler drives like an output device: it
//! reports its kind, state, format, latency and whether it owns a clock.

use std::time::Duration;

use crate::format::SampleSpec;
use crate::Frame;

/// A destination for audio frames.
///
/// `write` has no return signal. Failures are handled inside the writer.
pub trait FrameWriter {
    /// Consumes one fully populated frame.
    fn write(&mut self, frame: &mut Frame<'_>);
}

/// Kind of endpoint a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Consumes frames.
    Sink,
    /// Produces frames.
    Source,
}

/// Activity state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Processing frames.
    Active,
    /// Running, but has nothing to process.
    Idle,
    /// Explicitly paused.
    Paused,
}

/// A frame writer exposed to the host as an output device.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stream_sender::format::SampleSpec;
/// use stream_sender::sink::{DeviceState, DeviceType, FrameWriter, Sink};
/// use stream_sender::Frame;
///
/// struct NullSink;
///
/// impl FrameWriter for NullSink {
///     fn write(&mut self, _frame: &mut Frame<'_>) {}
/// }
///
/// impl Sink for NullSink {
///     fn sample_spec(&self) -> SampleSpec {
///         SampleSpec::default()
///     }
/// }
///
/// assert_eq!(NullSink.device_type(), DeviceType::Sink);
/// assert_eq!(NullSink.state(), DeviceState::Active);
/// assert_eq!(NullSink.latency(), Duration::ZERO);
/// ```
pub trait Sink: FrameWriter {
    /// Kind of endpoint. Always [`DeviceType::Sink`] unless overridden.
    fn device_type(&self) -> DeviceType {
        DeviceType::Sink
    }

    /// Current activity state.
    fn state(&self) -> DeviceState {
        DeviceState::Active
    }

    /// Pauses the device.
    fn pause(&mut self) {}

    /// Resumes after [`pause()`](Self::pause). Returns `false` on failure.
    fn resume(&mut self) -> bool {
        true
    }

    /// Restarts the device. Returns `false` on failure.
    fn restart(&mut self) -> bool {
        true
    }

    /// Format of the frames the device accepts.
    fn sample_spec(&self) -> SampleSpec;

    /// Latency the device adds.
    fn latency(&self) -> Duration {
        Duration::ZERO
    }

    /// Whether the device paces the stream with its own clock.
    fn has_clock(&self) -> bool {
        false
    }
}
