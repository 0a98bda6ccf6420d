//! Audio pipeline components.
//!
//! Frames flow from the sources through the mixer into the pipeline sink:
//!
//! ```text
//! Sources → Mixer → PipelineSink → [Profiler] → [Poisoner] → Fan-out → Slots
//! ```
//!
//! - **Mixer**: sums every input with saturation, in fixed-size chunks
//! - **Stages**: optional diagnostics chosen once from configuration
//! - **Fan-out**: replicates each frame to every registered slot
//! - **PipelineSink**: owns the chain and the slots, and aggregates the
//!   slots' maintenance deadlines into one
//!
//! On the receiving end of a slot, a [`Watchdog`] wraps a frame source and
//! silences it once playback is blank or broken for too long.

mod fanout;
mod mixer;
mod pipeline_sink;
mod poison;
mod profiler;
mod stage;
mod watchdog;

pub use mixer::{InputId, Mixer};
pub use pipeline_sink::PipelineSink;
pub use poison::{PoisonStage, POISON_SAMPLE};
pub use profiler::{Profiler, ProfilingStage};
pub use stage::Stage;
pub use watchdog::Watchdog;
