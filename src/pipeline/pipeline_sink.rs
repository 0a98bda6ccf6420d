//! Sink that feeds every destination slot through the diagnostic chain.

use std::fmt;
use std::sync::Arc;

use crate::buffer::BufferFactory;
use crate::config::SinkConfig;
use crate::format::SampleSpec;
use crate::pipeline::fanout::Fanout;
use crate::pipeline::poison::PoisonStage;
use crate::pipeline::profiler::ProfilingStage;
use crate::pipeline::stage::{Chain, Stage};
use crate::sink::{FrameWriter, Sink};
use crate::slot::{SlotContext, SlotFactory, SlotId, SlotPipeline};
use crate::time::{Clock, MonotonicClock, Nanos};
use crate::{Frame, PipelineError};

/// Aggregated update deadline with a validity bit.
#[derive(Debug, Clone, Copy, Default)]
struct DeadlineCache {
    value: Option<Nanos>,
    valid: bool,
}

/// Entry point of the sender side of the pipeline.
///
/// Frames written into the sink pass through the configured diagnostic
/// stages and are replicated to every slot. The sink also aggregates the
/// slots' maintenance schedules into one deadline so a single scheduler
/// can drive all of them.
///
/// The sink does no internal locking. Callers serialize access between
/// the frame-delivery and maintenance sides, for example with a mutex
/// (see [`UpdateScheduler`](crate::UpdateScheduler)).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use stream_sender::{
///     HeapBufferFactory, PipelineSink, RingSlot, SinkConfig, SlotContext, SlotError,
///     SlotPipeline,
/// };
///
/// let factory = |ctx: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
///     let (slot, _source) = RingSlot::new(ctx, 4096, Duration::from_secs(1));
///     Ok(Box::new(slot))
/// };
///
/// let mut sink = PipelineSink::new(
///     SinkConfig::default(),
///     Arc::new(HeapBufferFactory::new(512)),
///     factory,
/// )?;
/// let slot = sink.create_slot()?;
///
/// assert_eq!(sink.slot_count(), 1);
/// assert!(sink.update_deadline().is_some());
/// assert_eq!(sink.slot(slot).map(|s| s.name()), Some("ring-0"));
/// # Ok::<(), stream_sender::PipelineError>(())
/// ```
pub struct PipelineSink {
    config: SinkConfig,
    stages: Vec<Box<dyn Stage>>,
    fanout: Fanout,
    slot_factory: Box<dyn SlotFactory>,
    buffer_factory: Arc<dyn BufferFactory>,
    clock: Arc<dyn Clock>,
    deadline: DeadlineCache,
}

impl PipelineSink {
    /// Creates a sink on the process-wide monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageInit`] if a configured diagnostic
    /// stage can't be built.
    pub fn new(
        config: SinkConfig,
        buffer_factory: Arc<dyn BufferFactory>,
        slot_factory: impl SlotFactory + 'static,
    ) -> Result<Self, PipelineError> {
        Self::with_clock(config, buffer_factory, slot_factory, Arc::new(MonotonicClock))
    }

    /// Creates a sink measuring time and deadlines on `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageInit`] if a configured diagnostic
    /// stage can't be built.
    pub fn with_clock(
        config: SinkConfig,
        buffer_factory: Arc<dyn BufferFactory>,
        slot_factory: impl SlotFactory + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PipelineError> {
        // Each configured stage wraps the current head, so the last one
        // built runs first.
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();

        if config.poisoning {
            stages.insert(0, Box::new(PoisonStage::new()));
        }

        if config.profiling {
            let profiler = ProfilingStage::new(
                config.input_sample_spec,
                &config.profiler,
                clock.clone(),
            )
            .inspect_err(|e| tracing::error!(error = %e, "pipeline sink: can't create profiler"))?;
            stages.insert(0, Box::new(profiler));
        }

        tracing::debug!(
            stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            timing = config.timing,
            "pipeline sink: initialized"
        );

        Ok(Self {
            config,
            stages,
            fanout: Fanout::new(),
            slot_factory: Box::new(slot_factory),
            buffer_factory,
            clock,
            deadline: DeadlineCache::default(),
        })
    }

    /// Builds a new slot and registers it with the fan-out.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Slot`] if the slot factory fails. The sink
    /// is left unchanged.
    pub fn create_slot(&mut self) -> Result<SlotId, PipelineError> {
        let id = SlotId(self.fanout.len());
        tracing::info!(slot = %id, "pipeline sink: adding slot");

        let ctx = SlotContext {
            id,
            sample_spec: self.config.input_sample_spec,
            buffer_factory: self.buffer_factory.clone(),
            clock: self.clock.clone(),
        };

        let pipeline = self.slot_factory.new_slot(&ctx).map_err(|e| {
            tracing::error!(slot = %id, error = %e, "pipeline sink: can't create slot");
            PipelineError::from(e)
        })?;

        self.fanout.add(id, pipeline);
        self.invalidate_deadline();
        Ok(id)
    }

    /// Earliest pending slot deadline, or `None` if no slot has
    /// maintenance pending.
    ///
    /// The value is cached until the next [`create_slot()`](Self::create_slot),
    /// [`update()`](Self::update) or [`slot_mut()`](Self::slot_mut).
    pub fn update_deadline(&mut self) -> Option<Nanos> {
        if !self.deadline.valid {
            self.deadline = DeadlineCache {
                value: self
                    .fanout
                    .iter()
                    .filter_map(|slot| slot.pipeline.update_deadline())
                    .min(),
                valid: true,
            };
        }
        self.deadline.value
    }

    /// Runs maintenance on every slot in creation order.
    pub fn update(&mut self) {
        for slot in self.fanout.iter_mut() {
            slot.pipeline.update();
        }
        self.invalidate_deadline();
    }

    /// Looks up a slot.
    pub fn slot(&self, id: SlotId) -> Option<&dyn SlotPipeline> {
        self.fanout.get(id)
    }

    /// Looks up a slot for modification.
    ///
    /// Invalidates the cached deadline, since the slot may change it.
    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut (dyn SlotPipeline + 'static)> {
        self.invalidate_deadline();
        self.fanout.get_mut(id)
    }

    /// Number of registered slots.
    pub fn slot_count(&self) -> usize {
        self.fanout.len()
    }

    /// Names of the diagnostic stages, outermost first.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// The configuration the sink was built with.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    fn invalidate_deadline(&mut self) {
        self.deadline.valid = false;
    }
}

impl FrameWriter for PipelineSink {
    fn write(&mut self, frame: &mut Frame<'_>) {
        Chain::new(&mut self.stages, &mut self.fanout).write(frame);
    }
}

impl Sink for PipelineSink {
    fn sample_spec(&self) -> SampleSpec {
        self.config.input_sample_spec
    }

    fn has_clock(&self) -> bool {
        self.config.timing
    }
}

impl fmt::Debug for PipelineSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSink")
            .field("config", &self.config)
            .field("stages", &self.stage_names())
            .field("fanout", &self.fanout)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
