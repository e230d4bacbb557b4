use std::time::{Duration, Instant};

/// Fixed-delay tick schedule.
///
/// The next deadline is `interval` after the previous tick *finished*, so a
/// slow tick pushes every later tick back instead of causing a burst of
/// catch-up ticks.
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    interval: Duration,
    next: Option<Instant>,
}

impl FrameSchedule {
    pub const DEFAULT_FPS: f64 = 60.0;

    pub fn new(interval: Duration) -> Self {
        Self { interval, next: None }
    }

    /// Non-finite or non-positive rates fall back to [`Self::DEFAULT_FPS`].
    pub fn from_fps(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            log::warn!("invalid target fps {fps}; using {}", Self::DEFAULT_FPS);
            Self::DEFAULT_FPS
        };
        Self::new(Duration::from_secs_f64(1.0 / fps))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Makes the first tick due at `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_some_and(|next| now >= next)
    }

    /// Next deadline, `None` when stopped.
    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Schedules the next tick one interval after `finished`.
    pub fn reschedule(&mut self, finished: Instant) {
        if self.next.is_some() {
            self.next = Some(finished + self.interval);
        }
    }
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self::from_fps(Self::DEFAULT_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_schedule_is_never_due() {
        let now = Instant::now();
        let mut s = FrameSchedule::default();
        assert!(!s.is_due(now));

        s.start(now);
        assert!(s.is_due(now));

        s.stop();
        assert!(!s.is_due(now + Duration::from_secs(1)));
        s.reschedule(now);
        assert_eq!(s.deadline(), None);
    }

    #[test]
    fn delay_counts_from_tick_end() {
        let t0 = Instant::now();
        let mut s = FrameSchedule::new(Duration::from_millis(10));
        s.start(t0);

        // The tick overran by 25ms; the next one is 10ms after it finished.
        s.reschedule(t0 + Duration::from_millis(25));
        assert_eq!(s.deadline(), Some(t0 + Duration::from_millis(35)));
        assert!(!s.is_due(t0 + Duration::from_millis(34)));
        assert!(s.is_due(t0 + Duration::from_millis(35)));
    }

    #[test]
    fn invalid_fps_uses_default() {
        let d = FrameSchedule::default().interval();
        assert_eq!(FrameSchedule::from_fps(0.0).interval(), d);
        assert_eq!(FrameSchedule::from_fps(f64::NAN).interval(), d);
        assert_eq!(FrameSchedule::from_fps(-30.0).interval(), d);
    }
}
