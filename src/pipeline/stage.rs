//! Diagnostic stage chain.

use crate::pipeline::fanout::Fanout;
use crate::sink::FrameWriter;
use crate::Frame;

/// A diagnostic stage wrapping the rest of the pipeline.
///
/// A stage receives each frame before everything downstream of it and
/// decides what to do around the call to `next`.
pub trait Stage: Send {
    /// Short name for logging and introspection.
    fn name(&self) -> &'static str;

    /// Processes one frame, forwarding it to `next`.
    fn process(&mut self, frame: &mut Frame<'_>, next: &mut dyn FrameWriter);
}

/// The remainder of a stage chain, ending at the fan-out.
pub(crate) struct Chain<'a> {
    stages: &'a mut [Box<dyn Stage>],
    fanout: &'a mut Fanout,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(stages: &'a mut [Box<dyn Stage>], fanout: &'a mut Fanout) -> Self {
        Self { stages, fanout }
    }
}

impl FrameWriter for Chain<'_> {
    fn write(&mut self, frame: &mut Frame<'_>) {
        match self.stages.split_first_mut() {
            Some((head, rest)) => {
                let mut next = Chain::new(rest, self.fanout);
                head.process(frame, &mut next);
            }
            None => self.fanout.write(frame),
        }
    }
}
