//! Mix-and-send example.
//!
//! Mixes two synthetic tones, feeds the result through a profiled pipeline
//! sink into two ring slots, and lets the update scheduler run their
//! status reports.
//!
//! Run with: RUST_LOG=debug cargo run --example mix_and_send

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stream_sender::format::SampleSpec;
use stream_sender::time::{Clock, MonotonicClock};
use stream_sender::{
    Frame, FrameReader, FrameWriter, HeapBufferFactory, Mixer, MockSource, PipelineSink, RingSlot,
    RingSource, SinkConfig, SlotContext, SlotError, SlotPipeline, UpdateScheduler,
};
use tracing_subscriber::EnvFilter;

const FRAME_LENGTH: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let spec = SampleSpec::transcription();
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock);
    let buffers = Arc::new(HeapBufferFactory::new(spec.ns_to_samples_overall(FRAME_LENGTH)));

    // Two seconds of a 440Hz tone and one second of a 660Hz tone
    let mut low = MockSource::new(spec);
    low.generate_sine(440.0, 2000, 0.4);
    let mut high = MockSource::new(spec);
    high.generate_sine(660.0, 1000, 0.4);

    let mut mixer = Mixer::new(buffers.as_ref(), FRAME_LENGTH, spec)?;
    mixer.add_input(Box::new(low));
    mixer.add_input(Box::new(high));

    let sources: Arc<Mutex<Vec<RingSource>>> = Arc::default();
    let collected = sources.clone();
    let factory = move |ctx: &SlotContext| -> Result<Box<dyn SlotPipeline>, SlotError> {
        let (slot, source) = RingSlot::new(ctx, 16_000, Duration::from_millis(500));
        collected.lock().push(source);
        Ok(Box::new(slot))
    };

    let config = SinkConfig {
        input_sample_spec: spec,
        profiling: true,
        ..Default::default()
    };
    let mut sink = PipelineSink::with_clock(config, buffers, factory, clock.clone())?;
    sink.create_slot()?;
    sink.create_slot()?;

    let sink = Arc::new(Mutex::new(sink));
    let scheduler = UpdateScheduler::spawn(sink.clone(), clock);

    let mut storage = vec![0.0; spec.ns_to_samples_overall(FRAME_LENGTH)];
    let mut drained = storage.clone();
    let mut ticker = tokio::time::interval(FRAME_LENGTH);
    for _ in 0..200 {
        ticker.tick().await;
        let mut frame = Frame::new(&mut storage);
        mixer.read(&mut frame);
        sink.lock().write(&mut frame);

        // Drain the slots like a transport would
        for source in sources.lock().iter_mut() {
            while source.read(&mut Frame::new(&mut drained)) {}
        }
    }

    scheduler.stop().await?;

    for (i, source) in sources.lock().iter().enumerate() {
        println!("slot {i}: {} samples delivered", source.samples_read());
    }

    Ok(())
}
