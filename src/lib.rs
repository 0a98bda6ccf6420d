//! # stream-sender
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Real-time audio sender core: mixing, diagnostic stages and
//! per-destination maintenance scheduling.
//!
//! `stream-sender` combines any number of audio sources into one stream
//! with saturating arithmetic, pushes each frame through an optional chain
//! of diagnostic stages, and replicates it to every registered destination
//! slot. Each slot keeps its own maintenance schedule; the sink aggregates
//! them into a single deadline so one scheduler can drive them all.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stream_sender::{HeapBufferFactory, Mixer, MockSource, PipelineSink, RingSlot, SinkConfig};
//!
//! let buffers = Arc::new(HeapBufferFactory::new(1024));
//! let spec = SampleSpec::new(48000, 2);
//!
//! let mut mixer = Mixer::new(buffers.as_ref(), Duration::from_millis(10), spec)?;
//! mixer.add_input(Box::new(voice));
//! mixer.add_input(Box::new(music));
//!
//! let mut sink = PipelineSink::new(config, buffers, slot_factory)?;
//! sink.create_slot()?;
//!
//! let sink = Arc::new(Mutex::new(sink));
//! let scheduler = UpdateScheduler::spawn(sink.clone(), clock);
//!
//! // Frame-delivery loop
//! mixer.read(&mut frame);
//! sink.lock().write(&mut frame);
//! ```
//!
//! ## Architecture
//!
//! Two actors share each pipeline:
//!
//! - **Frame delivery**: reads the mixer and writes the sink at a fixed
//!   cadence. This path never allocates or blocks.
//! - **Maintenance**: waits for the sink's aggregated deadline and calls
//!   `update()`, see [`UpdateScheduler`].
//!
//! Components do no internal locking. Access to a sink from both actors is
//! serialized by the caller, typically with a mutex.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod buffer;
mod config;
mod error;
pub mod format;
mod frame;
mod pipeline;
mod scheduler;
pub mod sink;
mod slot;
pub mod source;
pub mod time;

pub use buffer::{BufferFactory, HeapBufferFactory, SampleBuffer};
pub use config::{ProfilerConfig, SinkConfig, WatchdogConfig};
pub use error::{MixerError, PipelineError, SlotError};
pub use frame::{saturating_add, Frame, FrameFlags, Sample, SAMPLE_MAX, SAMPLE_MIN};
pub use pipeline::{
    InputId, Mixer, PipelineSink, PoisonStage, Profiler, ProfilingStage, Stage, Watchdog,
    POISON_SAMPLE,
};
pub use scheduler::{SchedulerCommand, SchedulerHandle, UpdateScheduler};
pub use sink::FrameWriter;
pub use slot::{RingSlot, SlotContext, SlotFactory, SlotId, SlotPipeline};
pub use source::{FrameReader, MockSource, RingSource};
