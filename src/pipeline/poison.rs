//! Stage that overwrites frames once downstream is done with them.

use crate::pipeline::Stage;
use crate::sink::FrameWriter;
use crate::{Frame, Sample};

/// Pattern written over every sample after the frame is consumed.
///
/// Any slot that holds on to frame memory past `write` will read this
/// value instead of plausible audio.
pub const POISON_SAMPLE: Sample = f32::from_bits(0x7a7a_7a7a);

/// Poisons frame contents after forwarding them.
#[derive(Debug, Default)]
pub struct PoisonStage;

impl PoisonStage {
    /// Creates the stage.
    pub fn new() -> Self {
        Self
    }
}

impl Stage for PoisonStage {
    fn name(&self) -> &'static str {
        "poisoner"
    }

    fn process(&mut self, frame: &mut Frame<'_>, next: &mut dyn FrameWriter) {
        next.write(frame);
        frame.samples_mut().fill(POISON_SAMPLE);
    }
}
