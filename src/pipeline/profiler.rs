//! Processing-speed profiler and the stage that feeds it.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::ProfilerConfig;
use crate::format::SampleSpec;
use crate::pipeline::Stage;
use crate::sink::FrameWriter;
use crate::time::{Clock, Nanos, RateLimiter};
use crate::{Frame, PipelineError};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
struct ChunkStat {
    samples: usize,
    elapsed: Nanos,
}

impl ChunkStat {
    fn add(&mut self, other: ChunkStat) {
        self.samples += other.samples;
        self.elapsed += other.elapsed;
    }

    fn sub(&mut self, other: ChunkStat) {
        self.samples -= other.samples;
        self.elapsed -= other.elapsed;
    }
}

/// Rolling-window throughput meter.
///
/// Frames are accumulated into chunks of `chunk_duration` worth of
/// samples. The window holds the last `interval / chunk_duration`
/// completed chunks, and [`moving_avg()`](Self::moving_avg) is the number
/// of samples per channel processed per second of wall time across them.
#[derive(Debug)]
pub struct Profiler {
    chunk_samples: usize,
    window: VecDeque<ChunkStat>,
    capacity: usize,
    current: ChunkStat,
    total: ChunkStat,
    moving_avg: f64,
    reporter: RateLimiter,
}

impl Profiler {
    /// Creates a profiler for frames of the given format.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageInit`] if the format has no channels,
    /// if a chunk holds no samples, or if the interval is shorter than one
    /// chunk.
    pub fn new(
        spec: SampleSpec,
        config: &ProfilerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PipelineError> {
        if spec.channels() == 0 {
            return Err(PipelineError::stage_init("profiler", "zero channels"));
        }

        let chunk_samples = spec.ns_to_samples_per_chan(config.chunk_duration);
        if chunk_samples == 0 {
            return Err(PipelineError::stage_init(
                "profiler",
                format!("chunk of {:?} holds no samples", config.chunk_duration),
            ));
        }

        if config.interval < config.chunk_duration {
            return Err(PipelineError::stage_init(
                "profiler",
                format!(
                    "interval {:?} is shorter than chunk {:?}",
                    config.interval, config.chunk_duration
                ),
            ));
        }

        let capacity = (config.interval.as_nanos() / config.chunk_duration.as_nanos()) as usize;

        Ok(Self {
            chunk_samples,
            window: VecDeque::with_capacity(capacity),
            capacity,
            current: ChunkStat::default(),
            total: ChunkStat::default(),
            moving_avg: 0.0,
            reporter: RateLimiter::with_clock(config.interval, clock),
        })
    }

    /// Accounts one frame of `samples_per_chan` samples that took
    /// `elapsed` nanoseconds to process.
    pub fn add_frame(&mut self, samples_per_chan: usize, elapsed: Nanos) {
        self.current.add(ChunkStat {
            samples: samples_per_chan,
            elapsed,
        });

        if self.current.samples >= self.chunk_samples {
            self.close_chunk();
        }

        if !self.window.is_empty() && self.reporter.allow() {
            tracing::info!(
                speed = self.moving_avg,
                chunks = self.window.len(),
                "profiler: samples per second"
            );
        }
    }

    /// Samples per channel per second over the window, or zero until the
    /// first chunk completes.
    pub fn moving_avg(&self) -> f64 {
        self.moving_avg
    }

    fn close_chunk(&mut self) {
        let chunk = std::mem::take(&mut self.current);

        if self.window.len() == self.capacity {
            if let Some(oldest) = self.window.pop_front() {
                self.total.sub(oldest);
            }
        }
        self.window.push_back(chunk);
        self.total.add(chunk);

        if self.total.elapsed > 0 {
            self.moving_avg = self.total.samples as f64 * NANOS_PER_SEC / self.total.elapsed as f64;
        }
    }
}

/// Stage that times everything downstream of it.
#[derive(Debug)]
pub struct ProfilingStage {
    profiler: Profiler,
    clock: Arc<dyn Clock>,
    channels: usize,
}

impl ProfilingStage {
    /// Creates the stage for frames of the given format.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`Profiler::new`].
    pub fn new(
        spec: SampleSpec,
        config: &ProfilerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PipelineError> {
        let profiler = Profiler::new(spec, config, clock.clone())?;
        Ok(Self {
            profiler,
            clock,
            channels: usize::from(spec.channels()),
        })
    }

    /// The underlying profiler.
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}

impl Stage for ProfilingStage {
    fn name(&self) -> &'static str {
        "profiler"
    }

    fn process(&mut self, frame: &mut Frame<'_>, next: &mut dyn FrameWriter) {
        let started = self.clock.now();
        next.write(frame);
        let elapsed = self.clock.now().saturating_sub(started);

        self.profiler
            .add_frame(frame.num_samples() / self.channels, elapsed);
    }
}
