//! Sample format description and PCM conversion.
//!
//! - [`SampleSpec`]: sample rate and channel count, plus duration-to-sample
//!   arithmetic used to size frames and profiling chunks
//! - PCM conversion between [`Sample`](crate::Sample) and 16-bit integers,
//!   used by the ring-buffer slot and source

mod convert;
mod spec;

pub use convert::{pcm16_to_sample, sample_to_pcm16};
pub use spec::SampleSpec;
