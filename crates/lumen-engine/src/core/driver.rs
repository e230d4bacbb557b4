use std::time::Instant;

use crate::coords::Color;
use crate::device::{FrameStatus, GraphicsApi, Primitive};
use crate::error::ApiError;
use crate::render::DrawResources;
use crate::time::{FrameClock, FrameSchedule, FrameTime};

use super::AppControl;

/// Lifecycle of a [`FrameDriver`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    Uninitialized,
    Running,
    Stopped,
}

/// Clears the surface and draws the installed resources once per tick.
///
/// The driver owns the program and buffer it draws with and releases them
/// on [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    clear_color: Color,
    resources: Option<DrawResources>,
    schedule: FrameSchedule,
    clock: FrameClock,
    last_frame: Option<FrameTime>,
    draw_error_logged: bool,
}

impl FrameDriver {
    pub fn new(clear_color: Color, schedule: FrameSchedule) -> Self {
        Self {
            state: DriverState::Uninitialized,
            clear_color,
            resources: None,
            schedule,
            clock: FrameClock::new(),
            last_frame: None,
            draw_error_logged: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Takes effect at [`start`](Self::start); the clear color is set once.
    pub fn set_clear_color(&mut self, color: Color) {
        if self.state != DriverState::Uninitialized {
            log::warn!("clear color change ignored in state {:?}", self.state);
            return;
        }
        self.clear_color = color;
    }

    pub fn resources(&self) -> Option<&DrawResources> {
        self.resources.as_ref()
    }

    /// Hands `resources` to the driver. Previously installed resources are
    /// released first, so at most one program and one buffer are owned.
    pub fn install<A: GraphicsApi + ?Sized>(&mut self, api: &mut A, resources: DrawResources) {
        if self.state == DriverState::Stopped {
            log::warn!("resources installed into a stopped driver; releasing them");
            resources.release(api);
            return;
        }
        if let Some(previous) = self.resources.replace(resources) {
            previous.release(api);
        }
    }

    /// Sets the clear color and makes the first tick due at `now`.
    ///
    /// Only valid from [`DriverState::Uninitialized`]; returns `false`
    /// otherwise.
    pub fn start<A: GraphicsApi + ?Sized>(&mut self, api: &mut A, now: Instant) -> bool {
        if self.state != DriverState::Uninitialized {
            log::warn!("frame driver cannot start from {:?}", self.state);
            return false;
        }

        api.clear_color(self.clear_color);
        self.clock.reset(now);
        self.schedule.start(now);
        self.state = DriverState::Running;

        log::debug!(
            "frame driver running every {:?} (drawing: {})",
            self.schedule.interval(),
            self.resources.is_some()
        );
        true
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.state == DriverState::Running && self.schedule.is_due(now)
    }

    /// When the next tick is due; `None` unless running.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            DriverState::Running => self.schedule.deadline(),
            _ => None,
        }
    }

    /// Timing of the most recent tick.
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }

    /// Runs one tick if one is due at `now`.
    ///
    /// `now` is the only clock the driver reads: the next tick is due one
    /// interval after it.
    pub fn tick<A: GraphicsApi + ?Sized>(&mut self, api: &mut A, now: Instant) -> AppControl {
        if !self.is_due(now) {
            return AppControl::Continue;
        }

        let time = self.clock.tick(now);
        self.last_frame = Some(time);
        if time.dt > 2.0 * self.schedule.interval().as_secs_f32() {
            log::debug!(
                "frame {} late: {:.1}ms since the previous tick",
                time.frame_index,
                time.dt * 1e3
            );
        }

        let control = match api.begin_frame() {
            FrameStatus::Ready => {
                api.clear();
                if let Some(resources) = self.resources {
                    if let Err(e) = draw(api, &resources) {
                        if !self.draw_error_logged {
                            log::error!("draw failed at frame {}: {e}", time.frame_index);
                            self.draw_error_logged = true;
                        }
                    }
                }
                api.end_frame();
                AppControl::Continue
            }
            FrameStatus::Skipped => {
                log::trace!("frame {} skipped", time.frame_index);
                AppControl::Continue
            }
            FrameStatus::Lost => {
                log::error!("drawing surface lost at frame {}", time.frame_index);
                AppControl::Exit
            }
        };

        self.schedule.reschedule(now);
        control
    }

    /// Stops ticking and releases the owned resources. Idempotent.
    pub fn shutdown<A: GraphicsApi + ?Sized>(&mut self, api: &mut A) {
        if self.state == DriverState::Stopped {
            return;
        }

        if let Some(resources) = self.resources.take() {
            resources.release(api);
        }
        self.schedule.stop();
        self.state = DriverState::Stopped;
        log::debug!("frame driver stopped after {} tick(s)", self.clock.frame_index());
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(Color::black(), FrameSchedule::default())
    }
}

/// Binds, draws and unbinds. The program and buffer are unbound even when
/// an earlier step fails; the first error is returned.
fn draw<A: GraphicsApi + ?Sized>(api: &mut A, resources: &DrawResources) -> Result<(), ApiError> {
    let mut drawn = api.use_program(Some(resources.program));
    if drawn.is_ok() {
        drawn = api.bind_buffer(Some(resources.buffer));
    }
    if drawn.is_ok() {
        drawn = api.draw_arrays(Primitive::Triangles, 0, resources.vertex_count);
    }

    let unbound = api.bind_buffer(None);
    let unused = api.use_program(None);
    drawn.and(unbound).and(unused)
}
