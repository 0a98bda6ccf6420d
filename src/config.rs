//! Configuration types for the pipeline sink.

use std::time::Duration;

use crate::format::SampleSpec;

/// Settings for the profiling stage.
///
/// The profiler keeps a rolling window of `interval / chunk_duration`
/// chunks and reports the average processing speed over that window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Length of the rolling window, and the reporting period.
    ///
    /// Default: 5s
    pub interval: Duration,

    /// Amount of audio accounted as one window entry.
    ///
    /// Default: 10ms
    pub chunk_duration: Duration,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            chunk_duration: Duration::from_millis(10),
        }
    }
}

/// Settings for a [`Watchdog`](crate::Watchdog).
///
/// A zero timeout disables the corresponding check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Maximum stretch of consecutive frames without `NONBLANK`.
    ///
    /// Default: 2s
    pub no_playback_timeout: Duration,

    /// Maximum stretch in which every detection window had both
    /// `INCOMPLETE` and `DROPS` frames.
    ///
    /// Default: 2s
    pub broken_playback_timeout: Duration,

    /// Granularity of the broken-playback check. Must be non-zero and no
    /// longer than `broken_playback_timeout` when that check is enabled.
    ///
    /// Default: 300ms
    pub breakage_detection_window: Duration,

    /// Number of frames summarized per status line, zero to disable.
    ///
    /// Default: 20
    pub frame_status_window: usize,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            no_playback_timeout: Duration::from_secs(2),
            broken_playback_timeout: Duration::from_secs(2),
            breakage_detection_window: Duration::from_millis(300),
            frame_status_window: 20,
        }
    }
}

/// Configuration for a [`PipelineSink`](crate::PipelineSink).
///
/// Use [`SinkConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use stream_sender::format::SampleSpec;
/// use stream_sender::SinkConfig;
///
/// let config = SinkConfig {
///     input_sample_spec: SampleSpec::transcription(),
///     profiling: true,
///     ..Default::default()
/// };
/// assert!(!config.poisoning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Format of the frames written into the sink.
    ///
    /// Default: 44.1kHz stereo
    pub input_sample_spec: SampleSpec,

    /// Overwrite frames with a poison pattern after the slots consume them.
    ///
    /// Default: false
    pub poisoning: bool,

    /// Measure how fast frames pass through the slots.
    ///
    /// Default: false
    pub profiling: bool,

    /// Profiler settings, used when `profiling` is set.
    pub profiler: ProfilerConfig,

    /// Whether the sink paces the stream with its own clock.
    ///
    /// Default: false
    pub timing: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            input_sample_spec: SampleSpec::default(),
            poisoning: false,
            profiling: false,
            profiler: ProfilerConfig::default(),
            timing: false,
        }
    }
}
