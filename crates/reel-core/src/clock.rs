use std::time::{Duration, Instant};

use crate::error::CoreError;

/// Durée d'une frame pour une fréquence donnée.
///
/// # Errors
/// Returns [`CoreError::InvalidFrameRate`] if `frame_rate` is not strictly
/// positive and finite, or if `1 / frame_rate` does not fit a non-zero
/// [`Duration`].
///
/// # Example
/// ```
/// use reel_core::clock::frame_interval;
/// use std::time::Duration;
/// assert_eq!(frame_interval(4.0).unwrap(), Duration::from_millis(250));
/// assert!(frame_interval(0.0).is_err());
/// ```
pub fn frame_interval(frame_rate: f64) -> Result<Duration, CoreError> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(CoreError::InvalidFrameRate(frame_rate));
    }
    match Duration::try_from_secs_f64(1.0 / frame_rate) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(CoreError::InvalidFrameRate(frame_rate)),
    }
}

/// Horloge de cadencement à correction de dérive.
///
/// Chaque frame est calée sur une grille fixe `origin + k * interval` plutôt
/// que sur la frame précédente : la latence de rendu d'une frame raccourcit
/// l'attente suivante au lieu de s'accumuler.
///
/// Uses [`Instant`], so wall-clock adjustments (NTP, manual changes) during
/// playback have no effect on pacing.
///
/// # Example
/// ```
/// use reel_core::clock::Pacer;
/// use std::time::{Duration, Instant};
/// let origin = Instant::now();
/// let pacer = Pacer::with_origin(origin, Duration::from_millis(100));
/// let now = origin + Duration::from_millis(130);
/// // frame 1 rendered early: wait for its end of slot
/// assert_eq!(pacer.delay_after(1, now), Duration::from_millis(70));
/// // frame 0 overran its slot: move on at once
/// assert_eq!(pacer.delay_after(0, now), Duration::ZERO);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Pacer {
    origin: Instant,
    interval: Duration,
}

impl Pacer {
    /// Start a pacer whose origin is now.
    #[must_use]
    pub fn start(interval: Duration) -> Self {
        Self::with_origin(Instant::now(), interval)
    }

    /// Pacer with an explicit origin.
    #[must_use]
    pub fn with_origin(origin: Instant, interval: Duration) -> Self {
        debug_assert!(!interval.is_zero(), "intervalle nul");
        Self { origin, interval }
    }

    /// Session start (`t0`).
    #[must_use]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Duration of one frame.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time elapsed since `t0`. Saturates at zero for instants before it.
    #[must_use]
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.origin)
    }

    /// Ideal display offset of frame `index` (`index * interval`).
    #[must_use]
    pub fn ideal_offset(&self, index: usize) -> Duration {
        duration_from_nanos(self.interval.as_nanos() * index as u128)
    }

    /// `(index + 1) * interval - (now - t0)`: time left before frame
    /// `index + 1` is due. Zero once that instant has passed, so a late frame
    /// is followed immediately and the lag is caught up.
    #[must_use]
    pub fn delay_after(&self, index: usize, now: Instant) -> Duration {
        self.ideal_offset(index + 1).saturating_sub(self.elapsed_at(now))
    }

    /// How far frame `index`, finishing at `now`, ran past the end of its slot.
    #[must_use]
    pub fn overrun(&self, index: usize, now: Instant) -> Duration {
        self.elapsed_at(now).saturating_sub(self.ideal_offset(index + 1))
    }

    /// `true` if frame `index`, finishing at `now`, overran its slot.
    #[must_use]
    pub fn is_late(&self, index: usize, now: Instant) -> bool {
        !self.overrun(index, now).is_zero()
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn interval_rejects_non_positive_rates() {
        for rate in [0.0, -24.0, f64::NAN, f64::NEG_INFINITY, f64::INFINITY, 1e-300] {
            assert!(frame_interval(rate).is_err(), "rate {rate} accepté");
        }
        assert!(frame_interval(f64::MAX).is_err());
    }

    #[test]
    fn interval_for_ntsc_rate() {
        let d = frame_interval(30000.0 / 1001.0).unwrap();
        assert_eq!(d.as_micros(), 33366);
    }

    #[test]
    fn delay_absorbs_render_latency() {
        let t0 = Instant::now();
        let pacer = Pacer::with_origin(t0, 100 * MS);
        // frame 3 rendue en 40 ms après sa frontière
        assert_eq!(pacer.delay_after(3, t0 + 340 * MS), 60 * MS);
        // rendu instantané : un intervalle complet
        assert_eq!(pacer.delay_after(3, t0 + 300 * MS), 100 * MS);
    }

    #[test]
    fn overrun_proceeds_without_sleeping() {
        let t0 = Instant::now();
        let pacer = Pacer::with_origin(t0, 100 * MS);
        // frame 1 finie à 250 ms : la frame 2 était due à 200 ms
        assert_eq!(pacer.delay_after(1, t0 + 250 * MS), Duration::ZERO);
        // exactement un intervalle de rendu : pas d'attente non plus
        assert_eq!(pacer.delay_after(1, t0 + 200 * MS), Duration::ZERO);
        assert!(pacer.is_late(1, t0 + 250 * MS));
        assert!(!pacer.is_late(2, t0 + 250 * MS));
        assert_eq!(pacer.overrun(1, t0 + 250 * MS), 50 * MS);
    }

    #[test]
    fn instants_before_origin_saturate() {
        let now = Instant::now();
        let pacer = Pacer::with_origin(now + 50 * MS, 100 * MS);
        assert_eq!(pacer.elapsed_at(now), Duration::ZERO);
        assert_eq!(pacer.delay_after(0, now), 100 * MS);
    }

    #[test]
    fn lag_is_caught_up_by_later_frames() {
        let t0 = Instant::now();
        let pacer = Pacer::with_origin(t0, 100 * MS);
        // frame 0 prend 250 ms, les suivantes 10 ms
        assert_eq!(pacer.delay_after(0, t0 + 250 * MS), Duration::ZERO);
        assert_eq!(pacer.delay_after(1, t0 + 260 * MS), Duration::ZERO);
        assert_eq!(pacer.delay_after(2, t0 + 270 * MS), 30 * MS);
        // de retour sur la grille
        assert_eq!(pacer.delay_after(3, t0 + 410 * MS), 90 * MS);
    }

    #[test]
    fn ideal_offsets_are_multiples() {
        let pacer = Pacer::start(40 * MS);
        assert_eq!(pacer.ideal_offset(0), Duration::ZERO);
        assert_eq!(pacer.ideal_offset(25), Duration::from_secs(1));
    }
}
