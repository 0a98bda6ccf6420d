//! Error types for stream-sender.
//!
//! Errors are split into two categories:
//! - **Construction failures** ([`MixerError`], [`PipelineError`], [`SlotError`]):
//!   returned from fallible constructors and factories. An instance that
//!   failed to construct never exists, so it can never be operated on.
//! - **Precondition violations**: programming defects such as removing an
//!   input that was never added. These panic and are not reported as errors.

use std::time::Duration;

/// Errors that prevent a [`Mixer`](crate::Mixer) from being created.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// The frame length and sample format produce zero samples per frame.
    #[error("frame size is zero for frame length {frame_length:?}")]
    ZeroFrameSize {
        /// The requested frame length.
        frame_length: Duration,
    },

    /// The buffer factory could not produce a scratch buffer.
    #[error("can't allocate temporary buffer")]
    BufferUnavailable,

    /// The scratch buffer is smaller than one frame.
    #[error("allocated buffer is too small: capacity {capacity}, required {required}")]
    BufferTooSmall {
        /// Capacity of the buffer that was produced.
        capacity: usize,
        /// Number of samples one frame needs.
        required: usize,
    },
}

/// Errors raised by a [`SlotFactory`](crate::SlotFactory) while building
/// a destination pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// Resources for the slot could not be allocated.
    #[error("slot allocation failed: {reason}")]
    Allocation {
        /// Description of what could not be allocated.
        reason: String,
    },

    /// Custom error for user-implemented slot factories.
    #[error("{0}")]
    Custom(String),
}

impl SlotError {
    /// Creates a custom slot error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an allocation error with the given reason.
    pub fn allocation(reason: impl Into<String>) -> Self {
        Self::Allocation {
            reason: reason.into(),
        }
    }
}

/// Errors from building or driving a [`PipelineSink`](crate::PipelineSink).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A configured diagnostic stage failed to construct.
    #[error("stage '{stage}' failed to initialize: {reason}")]
    StageInit {
        /// Name of the stage that failed.
        stage: &'static str,
        /// Why the stage failed.
        reason: String,
    },

    /// A destination slot could not be created.
    #[error("can't create slot: {0}")]
    Slot(#[from] SlotError),

    /// The maintenance scheduler task ended abnormally.
    #[error("update scheduler failed: {reason}")]
    Scheduler {
        /// Description of the failure.
        reason: String,
    },
}

impl PipelineError {
    /// Creates a stage initialization error.
    pub fn stage_init(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::StageInit {
            stage,
            reason: reason.into(),
        }
    }
}
