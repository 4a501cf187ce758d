use std::time::Duration;

/// Comment une lecture s'est terminée.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame was displayed.
    Completed,
    /// A stop was requested before the last frame.
    Cancelled,
}

/// Bilan d'une lecture : cadence mesurée et frames en retard.
///
/// # Example
/// ```
/// use reel_render::stats::{PlaybackOutcome, PlaybackReport};
/// use std::time::Duration;
///
/// let report = PlaybackReport {
///     outcome: PlaybackOutcome::Completed,
///     frames_rendered: 30,
///     elapsed: Duration::from_secs(3),
///     late_frames: 0,
///     worst_overrun: Duration::ZERO,
/// };
/// assert!((report.effective_fps() - 10.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Fin normale ou interruption.
    pub outcome: PlaybackOutcome,
    /// Frames écrites sur le terminal.
    pub frames_rendered: usize,
    /// Temps écoulé depuis `t0` jusqu'à la fin de la boucle.
    pub elapsed: Duration,
    /// Frames dont le rendu a débordé de leur créneau.
    pub late_frames: usize,
    /// Plus grand débordement observé.
    pub worst_overrun: Duration,
}

impl PlaybackReport {
    /// Report of a session that displayed nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            outcome: PlaybackOutcome::Completed,
            frames_rendered: 0,
            elapsed: Duration::ZERO,
            late_frames: 0,
            worst_overrun: Duration::ZERO,
        }
    }

    /// Cadence réellement obtenue (0 si rien n'a été affiché).
    #[must_use]
    pub fn effective_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames_rendered as f64 / secs
        } else {
            0.0
        }
    }
}

/// Accumulateur tenu par la boucle de rendu.
#[derive(Debug, Default)]
pub(crate) struct FrameTally {
    rendered: usize,
    late: usize,
    worst_overrun: Duration,
}

impl FrameTally {
    /// Une frame affichée ; `overrun` = retard sur la fin de son créneau.
    pub(crate) fn record(&mut self, overrun: Duration) {
        self.rendered += 1;
        if !overrun.is_zero() {
            self.late += 1;
            self.worst_overrun = self.worst_overrun.max(overrun);
        }
    }

    pub(crate) fn rendered(&self) -> usize {
        self.rendered
    }

    pub(crate) fn finish(self, outcome: PlaybackOutcome, elapsed: Duration) -> PlaybackReport {
        PlaybackReport {
            outcome,
            frames_rendered: self.rendered,
            elapsed,
            late_frames: self.late,
            worst_overrun: self.worst_overrun,
        }
    }
}
