//! Background task that drives slot maintenance.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::time::{Clock, Nanos};
use crate::{PipelineError, PipelineSink};

const COMMAND_CAPACITY: usize = 8;

/// Commands sent to a running [`UpdateScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Re-read the sink's deadline, e.g. after a slot was added.
    Wake,
    /// Finish the task.
    Stop,
}

/// Sleeps until the sink's aggregated deadline and runs its maintenance.
///
/// The sink is shared with the frame-delivery side through a mutex. The
/// lock is taken only to read the deadline or run `update()`, and is never
/// held while the task waits.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use stream_sender::{HeapBufferFactory, PipelineSink, SinkConfig, SlotContext, SlotError, SlotPipeline};
/// use stream_sender::time::MonotonicClock;
/// use stream_sender::UpdateScheduler;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), stream_sender::PipelineError> {
/// # let factory = |_: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> { Err(SlotError::custom("unused")) };
/// # let sink = PipelineSink::new(SinkConfig::default(), Arc::new(HeapBufferFactory::new(64)), factory)?;
/// let sink = Arc::new(Mutex::new(sink));
/// let scheduler = UpdateScheduler::spawn(sink.clone(), Arc::new(MonotonicClock));
///
/// // After adding slots, let the scheduler pick up their deadlines
/// scheduler.wake();
///
/// scheduler.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct UpdateScheduler {
    sink: Arc<Mutex<PipelineSink>>,
    clock: Arc<dyn Clock>,
    cmd_rx: mpsc::Receiver<SchedulerCommand>,
}

impl UpdateScheduler {
    /// Starts the scheduler on the current tokio runtime.
    ///
    /// `clock` must be the clock the sink's slots publish deadlines on.
    pub fn spawn(sink: Arc<Mutex<PipelineSink>>, clock: Arc<dyn Clock>) -> SchedulerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let scheduler = Self {
            sink,
            clock,
            cmd_rx,
        };
        let handle = tokio::spawn(scheduler.run());
        SchedulerHandle { cmd_tx, handle }
    }

    async fn run(mut self) {
        tracing::debug!("update scheduler: started");

        loop {
            let deadline = self.sink.lock().update_deadline();

            let cmd = match deadline {
                None => self.cmd_rx.recv().await,
                Some(deadline) => {
                    tokio::select! {
                        () = tokio::time::sleep(self.delay_until(deadline)) => {
                            self.sink.lock().update();
                            continue;
                        }
                        cmd = self.cmd_rx.recv() => cmd,
                    }
                }
            };

            match cmd {
                Some(SchedulerCommand::Wake) => {}
                Some(SchedulerCommand::Stop) | None => break,
            }
        }

        tracing::debug!("update scheduler: stopped");
    }

    fn delay_until(&self, deadline: Nanos) -> Duration {
        Duration::from_nanos(deadline.saturating_sub(self.clock.now()))
    }
}

/// Handle to a running [`UpdateScheduler`].
///
/// Dropping the handle also ends the task, once it next waits for a
/// command.
#[derive(Debug)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::Sender<SchedulerCommand>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Asks the scheduler to re-read the sink's deadline.
    pub fn wake(&self) {
        // A full queue already holds a pending wake-up
        let _ = self.cmd_tx.try_send(SchedulerCommand::Wake);
    }

    /// Stops the scheduler and waits for the task to finish.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Scheduler`] if the task panicked or was
    /// cancelled.
    pub async fn stop(self) -> Result<(), PipelineError> {
        let _ = self.cmd_tx.send(SchedulerCommand::Stop).await;
        self.handle.await.map_err(|e| PipelineError::Scheduler {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{SlotContext, SlotPipeline};
    use crate::time::ManualClock;
    use crate::{Frame, HeapBufferFactory, SinkConfig, SlotError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Slot that asks for maintenance right away until its budget runs out.
    struct BudgetSlot {
        clock: Arc<dyn Clock>,
        remaining: usize,
        updates: Arc<AtomicUsize>,
    }

    impl SlotPipeline for BudgetSlot {
        fn name(&self) -> &str {
            "budget"
        }

        fn write(&mut self, _frame: &Frame<'_>) {}

        fn update(&mut self) {
            self.remaining = self.remaining.saturating_sub(1);
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn update_deadline(&self) -> Option<Nanos> {
            (self.remaining > 0).then(|| self.clock.now())
        }
    }

    fn sink(budget: usize, updates: &Arc<AtomicUsize>, clock: &ManualClock) -> PipelineSink {
        let updates = updates.clone();
        let factory = move |ctx: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
            Ok(Box::new(BudgetSlot {
                clock: ctx.clock.clone(),
                remaining: budget,
                updates: updates.clone(),
            }))
        };
        PipelineSink::with_clock(
            SinkConfig::default(),
            Arc::new(HeapBufferFactory::new(64)),
            factory,
            Arc::new(clock.clone()),
        )
        .unwrap()
    }

    async fn wait_for(updates: &AtomicUsize, expected: usize) {
        for _ in 0..200 {
            if updates.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_runs_updates_until_nothing_pending() {
        let clock = ManualClock::new();
        let updates = Arc::new(AtomicUsize::new(0));
        let mut sink = sink(3, &updates, &clock);
        sink.create_slot().unwrap();

        let sink = Arc::new(Mutex::new(sink));
        let handle = UpdateScheduler::spawn(sink.clone(), Arc::new(clock));

        wait_for(&updates, 3).await;
        handle.stop().await.unwrap();

        assert_eq!(updates.load(Ordering::SeqCst), 3);
        assert_eq!(sink.lock().update_deadline(), None);
    }

    #[tokio::test]
    async fn test_wake_picks_up_new_slot() {
        let clock = ManualClock::new();
        let updates = Arc::new(AtomicUsize::new(0));
        let sink = Arc::new(Mutex::new(sink(2, &updates, &clock)));
        let handle = UpdateScheduler::spawn(sink.clone(), Arc::new(clock));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(updates.load(Ordering::SeqCst), 0);

        sink.lock().create_slot().unwrap();
        handle.wake();

        wait_for(&updates, 2).await;
        handle.stop().await.unwrap();
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }

    struct FixedSlot(Nanos);

    impl SlotPipeline for FixedSlot {
        fn name(&self) -> &str {
            "fixed"
        }

        fn write(&mut self, _frame: &Frame<'_>) {}

        fn update(&mut self) {
            panic!("deadline is an hour away");
        }

        fn update_deadline(&self) -> Option<Nanos> {
            Some(self.0)
        }
    }

    #[tokio::test]
    async fn test_stop_while_waiting_for_deadline() {
        let clock = ManualClock::new();
        let factory = |_: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
            Ok(Box::new(FixedSlot(3_600_000_000_000)))
        };
        let mut sink = PipelineSink::with_clock(
            SinkConfig::default(),
            Arc::new(HeapBufferFactory::new(64)),
            factory,
            Arc::new(clock.clone()),
        )
        .unwrap();
        sink.create_slot().unwrap();

        let handle = UpdateScheduler::spawn(Arc::new(Mutex::new(sink)), Arc::new(clock));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop().await.unwrap();
    }
}
