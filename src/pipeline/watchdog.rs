//! Reader wrapper that detects dead or broken playback.

use crate::config::WatchdogConfig;
use crate::format::SampleSpec;
use crate::source::FrameReader;
use crate::{Frame, FrameFlags, PipelineError};

/// Flags that together mark a frame as broken.
const DROP_FLAGS: FrameFlags = FrameFlags::INCOMPLETE.union(FrameFlags::DROPS);

/// Terminates a stream that stopped playing or keeps breaking up.
///
/// Two checks run on the positions of the frames read through it, in
/// samples per channel:
///
/// - **Blank timeout**: no frame carried `NONBLANK` for
///   `no_playback_timeout`. Checked by [`update()`](Self::update).
/// - **Broken-playback timeout**: every `breakage_detection_window` saw
///   both `INCOMPLETE` and `DROPS` for `broken_playback_timeout`. Checked
///   on every read.
///
/// Once either fires the watchdog is dead: reads return silence and
/// `update()` returns `false`.
///
/// Each frame also contributes one symbol to a status line, logged at
/// debug level every `frame_status_window` frames if any frame was not
/// clean:
///
/// | Symbol | Frame |
/// |--------|-------|
/// | `.` | nonblank, complete, no drops |
/// | `b` | blank |
/// | `B` | blank with drops |
/// | `i` | incomplete |
/// | `I` | incomplete with drops |
/// | `D` | drops |
pub struct Watchdog {
    reader: Box<dyn FrameReader>,
    channels: usize,
    max_blank: u64,
    max_drops: u64,
    drop_window: u64,
    read_pos: u64,
    last_nonblank_pos: u64,
    last_clean_window_pos: u64,
    window_flags: FrameFlags,
    status: String,
    status_window: usize,
    status_show: bool,
    alive: bool,
}

impl Watchdog {
    /// Wraps `reader`, whose frames have the given format.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageInit`] if the format has no channels,
    /// or if the broken-playback check is enabled with a detection window
    /// that is zero or longer than the timeout.
    pub fn new(
        reader: Box<dyn FrameReader>,
        spec: SampleSpec,
        config: &WatchdogConfig,
    ) -> Result<Self, PipelineError> {
        if spec.channels() == 0 {
            return Err(PipelineError::stage_init("watchdog", "zero channels"));
        }

        let to_samples = |d| spec.ns_to_samples_per_chan(d) as u64;
        let max_blank = to_samples(config.no_playback_timeout);
        let max_drops = to_samples(config.broken_playback_timeout);
        let drop_window = to_samples(config.breakage_detection_window);

        if max_drops != 0 && (drop_window == 0 || drop_window > max_drops) {
            tracing::error!(
                max_drops,
                drop_window,
                "watchdog: invalid config: detection window should be in range (0; max_drops]"
            );
            return Err(PipelineError::stage_init(
                "watchdog",
                format!(
                    "detection window of {drop_window} samples not in range (0; {max_drops}]"
                ),
            ));
        }

        tracing::debug!(max_blank, max_drops, drop_window, "watchdog: initializing");

        Ok(Self {
            reader,
            channels: usize::from(spec.channels()),
            max_blank,
            max_drops,
            drop_window,
            read_pos: 0,
            last_nonblank_pos: 0,
            last_clean_window_pos: 0,
            window_flags: FrameFlags::empty(),
            status: String::with_capacity(config.frame_status_window),
            status_window: config.frame_status_window,
            status_show: false,
            alive: true,
        })
    }

    /// Runs the blank check. Returns `false` once the watchdog is dead.
    pub fn update(&mut self) -> bool {
        if !self.alive {
            return false;
        }

        if self.max_blank != 0 && self.read_pos - self.last_nonblank_pos >= self.max_blank {
            tracing::debug!(
                read_pos = self.read_pos,
                last_nonblank_pos = self.last_nonblank_pos,
                max_blank = self.max_blank,
                "watchdog: blank timeout reached"
            );
            self.terminate();
            return false;
        }

        true
    }

    /// Returns `false` once a timeout fired.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn track_blank(&mut self, flags: FrameFlags, next_pos: u64) {
        if self.max_blank != 0 && flags.contains(FrameFlags::NONBLANK) {
            self.last_nonblank_pos = next_pos;
        }
    }

    fn track_drops(&mut self, flags: FrameFlags, next_pos: u64) {
        if self.max_drops == 0 {
            return;
        }

        self.window_flags |= flags;

        let window_end = self.read_pos / self.drop_window * self.drop_window + self.drop_window;
        if window_end > next_pos {
            return;
        }

        if !self.window_flags.contains(DROP_FLAGS) {
            self.last_clean_window_pos = next_pos;
        }

        // A frame straddling the boundary also counts towards the next window
        self.window_flags = if next_pos % self.drop_window == 0 {
            FrameFlags::empty()
        } else {
            flags
        };
    }

    fn drops_timeout_reached(&self) -> bool {
        if self.max_drops == 0 || self.read_pos - self.last_clean_window_pos < self.max_drops {
            return false;
        }

        tracing::debug!(
            read_pos = self.read_pos,
            last_clean_window_pos = self.last_clean_window_pos,
            drop_window = self.drop_window,
            max_drops = self.max_drops,
            "watchdog: drops timeout reached"
        );
        true
    }

    fn track_status(&mut self, flags: FrameFlags) {
        if self.status_window == 0 {
            return;
        }

        let symbol = status_symbol(flags);
        self.status.push(symbol);
        self.status_show |= symbol != '.';

        if self.status.len() == self.status_window {
            self.flush_status();
        }
    }

    fn flush_status(&mut self) {
        if self.status_show {
            tracing::debug!(status = %self.status, "watchdog: status");
        }
        self.status.clear();
        self.status_show = false;
    }

    fn terminate(&mut self) {
        self.flush_status();
        self.alive = false;
    }
}

fn status_symbol(flags: FrameFlags) -> char {
    let drops = flags.contains(FrameFlags::DROPS);
    if !flags.contains(FrameFlags::NONBLANK) {
        if drops {
            'B'
        } else {
            'b'
        }
    } else if flags.contains(FrameFlags::INCOMPLETE) {
        if drops {
            'I'
        } else {
            'i'
        }
    } else if drops {
        'D'
    } else {
        '.'
    }
}

impl FrameReader for Watchdog {
    /// Reads through the wrapped reader. Once dead, always returns `true`
    /// with a silent frame.
    fn read(&mut self, frame: &mut Frame<'_>) -> bool {
        if !self.alive {
            frame.samples_mut().fill(0.0);
            frame.set_flags(FrameFlags::empty());
            return true;
        }

        if !self.reader.read(frame) {
            return false;
        }

        let flags = frame.flags();
        let next_pos = self.read_pos + (frame.num_samples() / self.channels) as u64;

        self.track_blank(flags, next_pos);
        self.track_drops(flags, next_pos);
        self.track_status(flags);

        self.read_pos = next_pos;

        if self.drops_timeout_reached() {
            self.terminate();
        }

        true
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("alive", &self.alive)
            .field("read_pos", &self.read_pos)
            .field("max_blank", &self.max_blank)
            .field("max_drops", &self.max_drops)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockSource, Sample};
    use std::collections::VecDeque;
    use std::time::Duration;

    /// 1kHz mono so that milliseconds map directly to samples.
    const SPEC: SampleSpec = SampleSpec::new(1000, 1);

    /// Replays a fixed sequence of frame flags with a constant sample value.
    struct Scripted {
        flags: VecDeque<FrameFlags>,
        value: Sample,
    }

    impl Scripted {
        fn boxed(flags: &[FrameFlags]) -> Box<Self> {
            Box::new(Self {
                flags: flags.iter().copied().collect(),
                value: 0.5,
            })
        }
    }

    impl FrameReader for Scripted {
        fn read(&mut self, frame: &mut Frame<'_>) -> bool {
            let Some(flags) = self.flags.pop_front() else {
                return false;
            };
            frame.samples_mut().fill(self.value);
            frame.set_flags(flags);
            true
        }
    }

    fn config(blank_ms: u64, drops_ms: u64, window_ms: u64, status: usize) -> WatchdogConfig {
        WatchdogConfig {
            no_playback_timeout: Duration::from_millis(blank_ms),
            broken_playback_timeout: Duration::from_millis(drops_ms),
            breakage_detection_window: Duration::from_millis(window_ms),
            frame_status_window: status,
        }
    }

    fn read_frame(watchdog: &mut Watchdog) -> (bool, Vec<Sample>) {
        let mut storage = vec![0.123; 4];
        let ok = watchdog.read(&mut Frame::new(&mut storage));
        (ok, storage)
    }

    const BROKEN: FrameFlags = FrameFlags::all();
    const CLEAN: FrameFlags = FrameFlags::NONBLANK;

    #[test]
    fn test_blank_timeout() {
        let source = MockSource::from_samples(SPEC, &[0.0; 64]);
        let mut watchdog = Watchdog::new(Box::new(source), SPEC, &config(10, 0, 0, 0)).unwrap();

        read_frame(&mut watchdog);
        read_frame(&mut watchdog);
        assert!(watchdog.update());

        // 12 blank samples against a 10 sample timeout
        read_frame(&mut watchdog);
        assert!(!watchdog.update());
        assert!(!watchdog.is_alive());
    }

    #[test]
    fn test_nonblank_frames_keep_it_alive() {
        let source = MockSource::from_samples(SPEC, &[0.5; 64]).with_flags(FrameFlags::NONBLANK);
        let mut watchdog = Watchdog::new(Box::new(source), SPEC, &config(10, 0, 0, 0)).unwrap();

        for _ in 0..16 {
            assert!(read_frame(&mut watchdog).0);
            assert!(watchdog.update());
        }
    }

    #[test]
    fn test_dead_watchdog_yields_silence() {
        let source = Scripted::boxed(&[FrameFlags::empty(), FrameFlags::empty(), CLEAN]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(8, 0, 0, 0)).unwrap();

        read_frame(&mut watchdog);
        read_frame(&mut watchdog);
        assert!(!watchdog.update());

        let (ok, samples) = read_frame(&mut watchdog);
        assert!(ok);
        assert_eq!(samples, vec![0.0; 4]);
        assert!(!watchdog.update());
    }

    #[test]
    fn test_drops_timeout_across_windows() {
        let source = Scripted::boxed(&[BROKEN, BROKEN, BROKEN, CLEAN]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(0, 12, 4, 0)).unwrap();

        assert!(read_frame(&mut watchdog).0);
        assert!(read_frame(&mut watchdog).0);
        assert!(watchdog.is_alive());

        // Third broken window reaches 12 samples
        assert!(read_frame(&mut watchdog).0);
        assert!(!watchdog.is_alive());

        let (ok, samples) = read_frame(&mut watchdog);
        assert!(ok);
        assert_eq!(samples, vec![0.0; 4]);
    }

    #[test]
    fn test_clean_window_resets_drops_timeout() {
        let source = Scripted::boxed(&[BROKEN, BROKEN, CLEAN, BROKEN, BROKEN]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(0, 12, 4, 0)).unwrap();

        for _ in 0..5 {
            assert!(read_frame(&mut watchdog).0);
        }
        assert!(watchdog.is_alive());
    }

    #[test]
    fn test_window_needs_both_drop_flags() {
        let partial = FrameFlags::NONBLANK | FrameFlags::DROPS;
        let source = Scripted::boxed(&[partial; 8]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(0, 8, 4, 0)).unwrap();

        for _ in 0..8 {
            read_frame(&mut watchdog);
        }
        assert!(watchdog.is_alive());
    }

    #[test]
    fn test_frames_spanning_windows() {
        // 4-sample frames against 3-sample windows
        let source = Scripted::boxed(&[BROKEN; 4]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(0, 12, 3, 0)).unwrap();

        for _ in 0..2 {
            read_frame(&mut watchdog);
        }
        assert!(watchdog.is_alive());

        read_frame(&mut watchdog);
        assert!(!watchdog.is_alive());
    }

    #[test]
    fn test_failed_read_passes_through() {
        let mut watchdog = Watchdog::new(Scripted::boxed(&[]), SPEC, &config(10, 0, 0, 0)).unwrap();
        assert!(!read_frame(&mut watchdog).0);
        assert!(watchdog.update());
    }

    #[test]
    fn test_rejects_zero_detection_window() {
        let err = Watchdog::new(Scripted::boxed(&[]), SPEC, &config(0, 10, 0, 0)).unwrap_err();
        assert!(matches!(err, PipelineError::StageInit { stage: "watchdog", .. }));
    }

    #[test]
    fn test_rejects_window_longer_than_timeout() {
        let result = Watchdog::new(Scripted::boxed(&[]), SPEC, &config(0, 10, 20, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_window_allowed_when_drops_check_disabled() {
        assert!(Watchdog::new(Scripted::boxed(&[]), SPEC, &config(10, 0, 0, 0)).is_ok());
    }

    #[test]
    fn test_rejects_zero_channels() {
        let result = Watchdog::new(
            Scripted::boxed(&[]),
            SampleSpec::new(1000, 0),
            &WatchdogConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_symbols() {
        assert_eq!(status_symbol(FrameFlags::NONBLANK), '.');
        assert_eq!(status_symbol(FrameFlags::empty()), 'b');
        assert_eq!(status_symbol(FrameFlags::DROPS), 'B');
        assert_eq!(status_symbol(FrameFlags::NONBLANK | FrameFlags::INCOMPLETE), 'i');
        assert_eq!(status_symbol(FrameFlags::all()), 'I');
        assert_eq!(status_symbol(FrameFlags::NONBLANK | FrameFlags::DROPS), 'D');
    }

    #[test]
    fn test_status_line_flushes_every_window() {
        let source = Scripted::boxed(&[
            CLEAN,
            FrameFlags::empty(),
            FrameFlags::NONBLANK | FrameFlags::DROPS,
            CLEAN,
            BROKEN,
        ]);
        let mut watchdog = Watchdog::new(source, SPEC, &config(0, 0, 0, 4)).unwrap();

        for _ in 0..3 {
            read_frame(&mut watchdog);
        }
        assert_eq!(watchdog.status, ".bD");

        read_frame(&mut watchdog);
        assert!(watchdog.status.is_empty());

        read_frame(&mut watchdog);
        assert_eq!(watchdog.status, "I");
    }
}
