use std::time::{Duration, Instant};

const DT_MIN: Duration = Duration::from_micros(100);
const DT_MAX: Duration = Duration::from_millis(250);

/// Timing snapshot of one tick.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Monotonic tick counter.
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots for the frame driver.
///
/// Delta time is clamped to `[100µs, 250ms]` so a process paused by the
/// debugger or minimized does not report a huge step.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the baseline the next delta is measured from.
    pub fn reset(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock to `now`.
    ///
    /// Without a baseline the tick reports the minimum delta.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).clamp(DT_MIN, DT_MAX),
            None => DT_MIN,
        };
        self.last = Some(now);

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        clock.reset(t0);

        let a = clock.tick(t0);
        assert_eq!(a.frame_index, 0);
        assert!((a.dt - 0.0001).abs() < 1e-6);

        let b = clock.tick(t0 + Duration::from_secs(5));
        assert_eq!(b.frame_index, 1);
        assert!((b.dt - 0.25).abs() < 1e-6);

        let c = clock.tick(t0 + Duration::from_secs(5) + Duration::from_millis(16));
        assert!((c.dt - 0.016).abs() < 1e-4);
        assert_eq!(clock.frame_index(), 3);
    }

    #[test]
    fn unstarted_clock_reports_minimum_step() {
        let mut clock = FrameClock::new();
        let t = clock.tick(Instant::now());
        assert_eq!(t.frame_index, 0);
        assert!((t.dt - DT_MIN.as_secs_f32()).abs() < 1e-9);
    }
}
