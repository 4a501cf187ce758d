use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use reel_audio::{AudioHandle, AudioLauncher};
use reel_core::clock::{Pacer, frame_interval};
use reel_core::frame::Animation;

use crate::error::PlaybackError;
use crate::signal::StopSignal;
use crate::stats::{FrameTally, PlaybackOutcome, PlaybackReport};
use crate::terminal;

/// Cycle de vie d'une session de lecture.
///
/// `Idle -> Playing -> {Completed, Cancelled, Failed}`. The terminal states
/// are only observable once the audio player has been stopped and the
/// terminal restored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing played yet.
    Idle,
    /// Render loop running.
    Playing,
    /// Last frame displayed.
    Completed,
    /// Stopped on request.
    Cancelled,
    /// Stopped by an error.
    Failed,
}

impl From<PlaybackOutcome> for PlaybackState {
    fn from(outcome: PlaybackOutcome) -> Self {
        match outcome {
            PlaybackOutcome::Completed => Self::Completed,
            PlaybackOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// Moteur de lecture : affiche une [`Animation`] à sa cadence sur `out`.
///
/// Frame `i` is shown as close as possible to `t0 + i / frame_rate`: after
/// each frame the loop sleeps until the next boundary of the `t0` grid, so
/// render and I/O latency never accumulate. The audio player is started
/// through the injected [`AudioLauncher`] right before `t0` and is never
/// re-synchronised afterwards.
///
/// # Example
/// ```
/// use reel_audio::SilentLauncher;
/// use reel_core::frame::{Animation, Frame};
/// use reel_render::player::{PlaybackState, Player};
///
/// let anim = Animation::new(200.0, vec![Frame::new(vec!["@ @".into()]).unwrap(); 3]).unwrap();
/// let mut out = Vec::new();
/// let mut player = Player::new(&mut out, Box::new(SilentLauncher));
/// let report = player.play(&anim, None).unwrap();
/// assert_eq!(report.frames_rendered, 3);
/// assert_eq!(player.state(), PlaybackState::Completed);
/// ```
pub struct Player<W: Write> {
    out: W,
    launcher: Box<dyn AudioLauncher>,
    hide_cursor: bool,
    stop: Option<StopSignal>,
    state: PlaybackState,
}

impl<W: Write> Player<W> {
    /// Player writing to `out` and starting audio through `launcher`.
    #[must_use]
    pub fn new(out: W, launcher: Box<dyn AudioLauncher>) -> Self {
        Self {
            out,
            launcher,
            hide_cursor: true,
            stop: None,
            state: PlaybackState::Idle,
        }
    }

    /// Masquer le curseur pendant la lecture (par défaut : oui).
    #[must_use]
    pub fn hide_cursor(mut self, hide: bool) -> Self {
        self.hide_cursor = hide;
        self
    }

    /// Allow the session to be interrupted through `stop`.
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play `animation`, with `track` on the audio player if given.
    ///
    /// A zero-frame animation returns at once without starting audio.
    ///
    /// # Errors
    /// - [`PlaybackError::InvalidFrameRate`] before anything is written;
    /// - [`PlaybackError::Audio`] if the player cannot start or failed on its own;
    /// - [`PlaybackError::Io`] if the terminal cannot be written.
    ///
    /// The audio player is stopped and the terminal restored before any of
    /// these is returned.
    pub fn play(
        &mut self,
        animation: &Animation,
        track: Option<&Path>,
    ) -> Result<PlaybackReport, PlaybackError> {
        let interval = frame_interval(animation.frame_rate())
            .map_err(|_| PlaybackError::InvalidFrameRate(animation.frame_rate()))?;

        self.state = PlaybackState::Playing;
        log::info!(
            "Lecture de {} frames à {} fps ({:?} par frame)",
            animation.len(),
            animation.frame_rate(),
            interval
        );

        let result = self.run(animation, track, interval);
        let restored = terminal::restore(&mut self.out, self.hide_cursor);

        let report = match (result, restored) {
            (Ok(report), Ok(())) => report,
            (Ok(_), Err(e)) => {
                self.state = PlaybackState::Failed;
                return Err(e.into());
            }
            (Err(e), restored) => {
                if let Err(io) = restored {
                    log::warn!("Restauration du terminal impossible : {io}");
                }
                self.state = PlaybackState::Failed;
                log::error!("Lecture interrompue : {e}");
                return Err(e);
            }
        };

        self.state = report.outcome.into();
        log::info!(
            "Lecture {:?} : {} frames en {:.2?} ({:.2} fps effectifs, {} en retard, pire retard {:?})",
            report.outcome,
            report.frames_rendered,
            report.elapsed,
            report.effective_fps(),
            report.late_frames,
            report.worst_overrun
        );
        Ok(report)
    }

    /// Render loop. `audio` is dropped on every early return, which stops
    /// the player.
    fn run(
        &mut self,
        animation: &Animation,
        track: Option<&Path>,
        interval: Duration,
    ) -> Result<PlaybackReport, PlaybackError> {
        terminal::begin(&mut self.out, self.hide_cursor)?;
        if animation.is_empty() {
            return Ok(PlaybackReport::empty());
        }

        let mut audio = match track {
            Some(track) => self.launcher.launch(track)?,
            None => AudioHandle::detached(),
        };
        let pacer = Pacer::start(interval);
        let mut tally = FrameTally::default();
        let mut outcome = PlaybackOutcome::Completed;

        for (index, frame) in animation.frames().iter().enumerate() {
            if self.stop_requested() {
                outcome = PlaybackOutcome::Cancelled;
                break;
            }
            terminal::draw_frame(&mut self.out, frame)?;

            let now = Instant::now();
            let overrun = pacer.overrun(index, now);
            if !overrun.is_zero() {
                log::debug!("Frame {index} en retard de {overrun:?}");
            }
            tally.record(overrun);

            if self.wait(pacer.delay_after(index, now)) {
                outcome = PlaybackOutcome::Cancelled;
                break;
            }
        }
        let elapsed = pacer.elapsed_at(Instant::now());

        if outcome == PlaybackOutcome::Cancelled {
            log::info!("Arrêt demandé après {} frames", tally.rendered());
        }
        audio.release()?;
        Ok(tally.finish(outcome, elapsed))
    }

    fn stop_requested(&mut self) -> bool {
        self.stop.as_mut().is_some_and(StopSignal::is_stopped)
    }

    /// Interruptible sleep; `true` if a stop arrived.
    fn wait(&mut self, delay: Duration) -> bool {
        match self.stop.as_mut() {
            Some(stop) => stop.wait(delay),
            None => {
                std::thread::sleep(delay);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{StopHandle, stop_channel};
    use reel_audio::{AudioError, AudioProcess};
    use reel_core::error::CoreError;
    use reel_core::frame::Frame;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MOVE_HOME: &[u8] = b"\x1b[1;1H";

    fn animation(frames: usize, rate: f64) -> Animation {
        let frames = (0..frames)
            .map(|i| {
                let c = char::from(b'a' + (i % 26) as u8);
                Frame::new(vec![c.to_string().repeat(4), "....".into()]).unwrap()
            })
            .collect();
        Animation::new(rate, frames).unwrap()
    }

    fn count_moves(buf: &[u8]) -> usize {
        buf.windows(MOVE_HOME.len()).filter(|w| *w == MOVE_HOME).count()
    }

    /// Lecteur factice : compte lancements et arrêts.
    #[derive(Clone, Default)]
    struct FakeLauncher {
        launches: Arc<AtomicUsize>,
        terminations: Arc<AtomicUsize>,
        fail_on_release: bool,
    }

    struct FakeProcess {
        terminations: Arc<AtomicUsize>,
        fail: bool,
    }

    impl AudioProcess for FakeProcess {
        fn terminate(&mut self) -> Result<(), AudioError> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CoreError::ExternalProcess {
                    program: "fake".into(),
                    status: "exit status: 1".into(),
                    stderr: "no audio device".into(),
                }
                .into());
            }
            Ok(())
        }

        fn id(&self) -> Option<u32> {
            None
        }
    }

    impl AudioLauncher for FakeLauncher {
        fn launch(&self, _track: &Path) -> Result<AudioHandle, AudioError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(AudioHandle::new(Box::new(FakeProcess {
                terminations: Arc::clone(&self.terminations),
                fail: self.fail_on_release,
            })))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct BrokenLauncher;

    impl AudioLauncher for BrokenLauncher {
        fn launch(&self, track: &Path) -> Result<AudioHandle, AudioError> {
            Err(AudioError::TrackNotFound(track.to_path_buf()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    /// Terminal lent : chaque flush coûte `delay`.
    struct SlowWriter {
        buf: Vec<u8>,
        delay: Duration,
    }

    impl Write for SlowWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            std::thread::sleep(self.delay);
            Ok(())
        }
    }

    /// Demande l'arrêt une fois `after` frames affichées.
    struct StopAfter {
        buf: Vec<u8>,
        after: usize,
        handle: StopHandle,
    }

    impl Write for StopAfter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            // Un MoveTo pour l'effacement initial, puis un par frame.
            if count_moves(&self.buf) == self.after + 1 {
                self.handle.stop();
            }
            Ok(())
        }
    }

    /// Terminal qui casse au bout de `fail_at` flushes.
    struct FailingWriter {
        flushes: usize,
        fail_at: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            if self.flushes >= self.fail_at {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal fermé"));
            }
            Ok(())
        }
    }

    fn track() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let track = dir.path().join("clip.wav");
        std::fs::write(&track, b"RIFF").unwrap();
        (dir, track)
    }

    #[test]
    fn starts_idle() {
        let player = Player::new(Vec::new(), Box::new(FakeLauncher::default()));
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn output_is_clear_then_frames_in_place() {
        let anim = Animation::new(
            1000.0,
            vec![
                Frame::new(vec!["ab".into(), "cd".into()]).unwrap(),
                Frame::new(vec!["ef".into(), "gh".into()]).unwrap(),
            ],
        )
        .unwrap();
        let mut out = Vec::new();
        Player::new(&mut out, Box::new(FakeLauncher::default()))
            .play(&anim, None)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\x1b[?25l\x1b[2J\x1b[1;1H\x1b[1;1Hab\ncd\x1b[1;1Hef\ngh\n\x1b[?25h"
        );
    }

    #[test]
    fn thirty_frames_at_ten_fps_take_three_seconds() {
        let anim = animation(30, 10.0);
        let mut out = SlowWriter {
            buf: Vec::new(),
            delay: Duration::from_millis(60),
        };
        let start = Instant::now();
        let report = Player::new(&mut out, Box::new(FakeLauncher::default()))
            .play(&anim, None)
            .unwrap();
        let total = start.elapsed();

        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        assert_eq!(report.frames_rendered, 30);
        assert!(
            report.elapsed >= Duration::from_millis(2900)
                && report.elapsed <= Duration::from_millis(3200),
            "durée mesurée {:?}",
            report.elapsed
        );
        // + un flush lent avant t0 et un après la boucle.
        assert!(total <= Duration::from_millis(3400), "durée totale {total:?}");
        assert_eq!(count_moves(&out.buf), 31);
    }

    #[test]
    fn render_as_long_as_a_frame_keeps_the_pace() {
        // Chaque frame consomme tout son créneau : aucune attente, aucun retard cumulé.
        let anim = animation(20, 10.0);
        let mut out = SlowWriter {
            buf: Vec::new(),
            delay: Duration::from_millis(100),
        };
        let report = Player::new(&mut out, Box::new(FakeLauncher::default()))
            .play(&anim, None)
            .unwrap();
        assert_eq!(report.frames_rendered, 20);
        assert!(
            report.elapsed >= Duration::from_millis(1990)
                && report.elapsed <= Duration::from_millis(2150),
            "durée mesurée {:?}",
            report.elapsed
        );
    }

    #[test]
    fn slow_frames_run_back_to_back() {
        // Rendu plus long qu'une frame : on enchaîne sans dormir.
        let anim = animation(5, 10.0);
        let mut out = SlowWriter {
            buf: Vec::new(),
            delay: Duration::from_millis(150),
        };
        let report = Player::new(&mut out, Box::new(FakeLauncher::default()))
            .play(&anim, None)
            .unwrap();
        assert_eq!(report.frames_rendered, 5);
        assert_eq!(report.late_frames, 5);
        // frame 4 finie vers 750 ms, due à 500 ms
        assert!(report.worst_overrun >= Duration::from_millis(250));
        assert!(
            report.elapsed >= Duration::from_millis(750)
                && report.elapsed <= Duration::from_millis(850),
            "durée mesurée {:?}",
            report.elapsed
        );
    }

    #[test]
    fn empty_animation_returns_at_once_without_audio() {
        let launcher = FakeLauncher::default();
        let (_dir, track) = track();
        let mut player = Player::new(Vec::new(), Box::new(launcher.clone()));
        let start = Instant::now();
        let report = player.play(&animation(0, 24.0), Some(&track)).unwrap();

        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(report, PlaybackReport::empty());
        assert_eq!(player.state(), PlaybackState::Completed);
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn audio_is_released_once_on_completion() {
        let launcher = FakeLauncher::default();
        let (_dir, track) = track();
        let mut player = Player::new(Vec::new(), Box::new(launcher.clone()));
        player.play(&animation(3, 100.0), Some(&track)).unwrap();
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancellation_after_frame_five_stops_audio_once() {
        let launcher = FakeLauncher::default();
        let (_dir, track) = track();
        let (handle, signal) = stop_channel();
        let mut out = StopAfter {
            buf: Vec::new(),
            after: 5,
            handle,
        };
        let mut player =
            Player::new(&mut out, Box::new(launcher.clone())).with_stop_signal(signal);
        let start = Instant::now();
        let report = player.play(&animation(30, 10.0), Some(&track)).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
        assert_eq!(report.frames_rendered, 5);
        assert_eq!(player.state(), PlaybackState::Cancelled);
        // Pas d'attente du créneau suivant une fois l'arrêt demandé.
        assert!(start.elapsed() < Duration::from_millis(900));
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_before_start_draws_nothing() {
        let (handle, signal) = stop_channel();
        handle.stop();
        let mut out = Vec::new();
        let report = Player::new(&mut out, Box::new(FakeLauncher::default()))
            .with_stop_signal(signal)
            .play(&animation(10, 10.0), None)
            .unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
        assert_eq!(report.frames_rendered, 0);
        assert_eq!(count_moves(&out), 1);
    }

    #[test]
    fn terminal_failure_still_stops_audio() {
        let launcher = FakeLauncher::default();
        let (_dir, track) = track();
        let out = FailingWriter {
            flushes: 0,
            fail_at: 3,
        };
        let mut player = Player::new(out, Box::new(launcher.clone()));
        let result = player.play(&animation(10, 100.0), Some(&track));

        assert!(matches!(result, Err(PlaybackError::Io(_))));
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_audio_player_is_surfaced_after_teardown() {
        let launcher = FakeLauncher {
            fail_on_release: true,
            ..FakeLauncher::default()
        };
        let (_dir, track) = track();
        let mut out = Vec::new();
        let mut player = Player::new(&mut out, Box::new(launcher.clone()));
        let result = player.play(&animation(2, 100.0), Some(&track));

        assert!(matches!(
            result,
            Err(PlaybackError::Audio(AudioError::Player(CoreError::ExternalProcess { .. })))
        ));
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
        assert!(out.ends_with(b"\n\x1b[?25h"), "terminal non restauré");
    }

    #[test]
    fn audio_launch_failure_fails_before_the_first_frame() {
        let mut out = Vec::new();
        let mut player = Player::new(&mut out, Box::new(BrokenLauncher));
        let result = player.play(&animation(5, 10.0), Some(Path::new("/nonexistent/clip.wav")));
        assert!(matches!(
            result,
            Err(PlaybackError::Audio(AudioError::TrackNotFound(_)))
        ));
        assert_eq!(player.state(), PlaybackState::Failed);
        assert_eq!(count_moves(&out), 1);
        assert!(out.ends_with(b"\n\x1b[?25h"));
    }

    #[cfg(target_os = "linux")]
    mod processes {
        use super::*;
        use reel_audio::CommandLauncher;
        use std::process::Command;
        use std::sync::Mutex;

        /// Note le pid du processus lancé.
        struct PidLauncher {
            inner: CommandLauncher,
            pid: Arc<Mutex<Option<u32>>>,
        }

        impl AudioLauncher for PidLauncher {
            fn launch(&self, track: &Path) -> Result<AudioHandle, AudioError> {
                let handle = self.inner.launch(track)?;
                *self.pid.lock().unwrap() = handle.id();
                Ok(handle)
            }

            fn name(&self) -> &str {
                self.inner.name()
            }
        }

        fn sleeping_player() -> (PidLauncher, Arc<Mutex<Option<u32>>>) {
            let pid = Arc::new(Mutex::new(None));
            let launcher = PidLauncher {
                inner: CommandLauncher::new("sh", ["-c", "exec sleep 30", "sh"]),
                pid: Arc::clone(&pid),
            };
            (launcher, pid)
        }

        /// Comme un Ctrl-C qui atteindrait aussi le lecteur : SIGINT au
        /// lecteur puis arrêt, une fois `after` frames affichées.
        struct InterruptAfter {
            buf: Vec<u8>,
            after: usize,
            pid: Arc<Mutex<Option<u32>>>,
            handle: StopHandle,
            sent: bool,
        }

        impl Write for InterruptAfter {
            fn write(&mut self, data: &[u8]) -> io::Result<usize> {
                self.buf.extend_from_slice(data);
                Ok(data.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                if !self.sent && count_moves(&self.buf) == self.after + 1 {
                    self.sent = true;
                    let pid = self.pid.lock().unwrap().unwrap();
                    let status = Command::new("kill")
                        .args(["-INT", &pid.to_string()])
                        .status()?;
                    assert!(status.success());
                    std::thread::sleep(Duration::from_millis(100));
                    self.handle.stop();
                }
                Ok(())
            }
        }

        #[test]
        fn cancelled_playback_leaves_no_audio_process() {
            let (launcher, pid) = sleeping_player();
            let (_dir, track) = track();
            let (handle, signal) = stop_channel();
            let mut out = StopAfter {
                buf: Vec::new(),
                after: 5,
                handle,
            };
            let report = Player::new(&mut out, Box::new(launcher))
                .with_stop_signal(signal)
                .play(&animation(30, 10.0), Some(&track))
                .unwrap();

            assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
            let pid = pid.lock().unwrap().unwrap();
            assert!(
                !Path::new(&format!("/proc/{pid}")).exists(),
                "lecteur audio {pid} toujours en vie"
            );
        }

        #[test]
        fn interrupt_reaching_the_player_is_still_a_cancellation() {
            let (launcher, pid) = sleeping_player();
            let (_dir, track) = track();
            let (handle, signal) = stop_channel();
            let mut out = InterruptAfter {
                buf: Vec::new(),
                after: 5,
                pid: Arc::clone(&pid),
                handle,
                sent: false,
            };
            let mut player = Player::new(&mut out, Box::new(launcher)).with_stop_signal(signal);
            let report = player.play(&animation(30, 10.0), Some(&track)).unwrap();

            assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
            assert_eq!(report.frames_rendered, 5);
            assert_eq!(player.state(), PlaybackState::Cancelled);
        }
    }
}
