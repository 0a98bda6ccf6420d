//! Sample rate and channel layout.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Sample rate and channel count of an interleaved stream.
///
/// # Example
///
/// ```
/// use stream_sender::format::SampleSpec;
/// use std::time::Duration;
///
/// let spec = SampleSpec::new(48000, 2);
/// // 10ms at 48kHz stereo = 480 frames * 2 channels
/// assert_eq!(spec.ns_to_samples_overall(Duration::from_millis(10)), 960);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    sample_rate: u32,
    channels: u16,
}

impl SampleSpec {
    /// Creates a new spec.
    #[must_use]
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// 16kHz mono, the usual format for speech pipelines.
    #[must_use]
    pub const fn transcription() -> Self {
        Self::new(16000, 1)
    }

    /// Sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Returns `true` if both rate and channel count are non-zero.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sample_rate != 0 && self.channels != 0
    }

    /// Number of samples per channel covering `duration`, rounded to nearest.
    #[must_use]
    pub fn ns_to_samples_per_chan(&self, duration: Duration) -> usize {
        let rate = u128::from(self.sample_rate);
        let samples = (duration.as_nanos() * rate + NANOS_PER_SEC / 2) / NANOS_PER_SEC;
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    /// Number of interleaved samples across all channels covering `duration`.
    #[must_use]
    pub fn ns_to_samples_overall(&self, duration: Duration) -> usize {
        self.ns_to_samples_per_chan(duration)
            .saturating_mul(usize::from(self.channels))
    }

    /// Duration covered by the given number of samples per channel.
    #[must_use]
    pub fn samples_per_chan_to_duration(&self, samples: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = samples as u128 * NANOS_PER_SEC / u128::from(self.sample_rate);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for SampleSpec {
    /// 44.1kHz stereo.
    fn default() -> Self {
        Self::new(44100, 2)
    }
}
