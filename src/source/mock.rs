//! Mock audio source for testing without hardware.

use std::collections::VecDeque;
use std::time::Duration;

use crate::format::SampleSpec;
use crate::source::FrameReader;
use crate::{Frame, FrameFlags, Sample};

/// A mock source that plays back synthetic audio queued in advance.
///
/// Each [`read()`](FrameReader::read) consumes exactly one frame's worth
/// of queued samples and reports the configured flags. When fewer samples
/// are queued than the frame needs, the read fails and nothing is consumed.
///
/// # Example
///
/// ```
/// use stream_sender::{Frame, FrameReader, MockSource};
/// use stream_sender::format::SampleSpec;
///
/// let mut mock = MockSource::new(SampleSpec::transcription());
///
/// // 10ms of silence followed by 10ms of a 440Hz sine wave
/// mock.generate_silence(10);
/// mock.generate_sine(440.0, 10, 0.5);
///
/// let mut storage = [0.0f32; 160];
/// assert!(mock.read(&mut Frame::new(&mut storage)));
/// assert!(mock.read(&mut Frame::new(&mut storage)));
/// assert!(!mock.read(&mut Frame::new(&mut storage)));
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    spec: SampleSpec,
    samples: VecDeque<Sample>,
    flags: FrameFlags,
}

impl MockSource {
    /// Creates an empty mock source with the given format.
    pub fn new(spec: SampleSpec) -> Self {
        Self {
            spec,
            samples: VecDeque::new(),
            flags: FrameFlags::empty(),
        }
    }

    /// Creates a mock source pre-loaded with raw samples.
    pub fn from_samples(spec: SampleSpec, samples: &[Sample]) -> Self {
        let mut mock = Self::new(spec);
        mock.add_samples(samples);
        mock
    }

    /// Sets the flags reported with every successful read.
    #[must_use]
    pub fn with_flags(mut self, flags: FrameFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the sample format.
    pub fn spec(&self) -> SampleSpec {
        self.spec
    }

    /// Queues silence for the given duration in milliseconds.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        self.samples.extend(std::iter::repeat(0.0).take(num_samples));
    }

    /// Queues a sine wave at the given frequency and amplitude.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64, amplitude: Sample) {
        let channels = usize::from(self.spec.channels().max(1));
        let num_frames = self.samples_for_duration(duration_ms) / channels;
        let sample_rate = f64::from(self.spec.sample_rate());

        for i in 0..num_frames {
            let t = i as f64 / sample_rate;
            let value = (2.0 * std::f64::consts::PI * frequency * t).sin() as Sample;

            // Write same sample to all channels
            for _ in 0..channels {
                self.samples.push_back(value * amplitude);
            }
        }
    }

    /// Queues raw samples.
    pub fn add_samples(&mut self, samples: &[Sample]) {
        self.samples.extend(samples.iter().copied());
    }

    /// Number of samples still queued.
    pub fn queued(&self) -> usize {
        self.samples.len()
    }

    /// Duration of queued audio.
    pub fn duration(&self) -> Duration {
        let channels = usize::from(self.spec.channels().max(1));
        self.spec
            .samples_per_chan_to_duration(self.samples.len() / channels)
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        self.spec
            .ns_to_samples_overall(Duration::from_millis(duration_ms))
    }
}

impl FrameReader for MockSource {
    fn read(&mut self, frame: &mut Frame<'_>) -> bool {
        if self.samples.len() < frame.num_samples() {
            return false;
        }

        let n = frame.num_samples();
        for (dst, src) in frame.samples_mut().iter_mut().zip(self.samples.drain(..n)) {
            *dst = src;
        }
        frame.set_flags(self.flags);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_silence() {
        let mut mock = MockSource::new(SampleSpec::transcription());
        mock.generate_silence(100);

        assert_eq!(mock.queued(), 1600); // 16000 * 0.1
        let mut storage = vec![1.0; 1600];
        assert!(mock.read(&mut Frame::new(&mut storage)));
        assert!(storage.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mock_source_sine() {
        let mut mock = MockSource::new(SampleSpec::transcription());
        mock.generate_sine(440.0, 100, 1.0);

        let mut storage = vec![0.0; 1600];
        assert!(mock.read(&mut Frame::new(&mut storage)));

        // Sine wave should have positive and negative values
        assert!(storage.iter().any(|&s| s > 0.0));
        assert!(storage.iter().any(|&s| s < 0.0));
    }

    #[test]
    fn test_mock_source_stereo() {
        let mut mock = MockSource::new(SampleSpec::new(48000, 2));
        mock.generate_silence(100);
        // 48000 * 0.1 * 2 channels = 9600
        assert_eq!(mock.queued(), 9600);
        assert_eq!(mock.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_read_consumes_one_frame() {
        let mut mock = MockSource::from_samples(SampleSpec::transcription(), &[1.0, 2.0, 3.0]);
        let mut storage = [0.0; 2];
        assert!(mock.read(&mut Frame::new(&mut storage)));
        assert_eq!(storage, [1.0, 2.0]);
        assert_eq!(mock.queued(), 1);
    }

    #[test]
    fn test_short_read_fails_without_consuming() {
        let mut mock = MockSource::from_samples(SampleSpec::transcription(), &[1.0]);
        let mut storage = [0.0; 2];
        assert!(!mock.read(&mut Frame::new(&mut storage)));
        assert_eq!(mock.queued(), 1);
    }

    #[test]
    fn test_reports_configured_flags() {
        let mut mock = MockSource::from_samples(SampleSpec::transcription(), &[0.5, 0.5])
            .with_flags(FrameFlags::NONBLANK | FrameFlags::DROPS);
        let mut storage = [0.0; 2];
        let mut frame = Frame::new(&mut storage);
        assert!(mock.read(&mut frame));
        assert_eq!(frame.flags(), FrameFlags::NONBLANK | FrameFlags::DROPS);
    }
}
