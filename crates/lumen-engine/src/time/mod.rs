//! Time subsystem.
//!
//! Frame timing and tick scheduling, independent of the runtime so both can
//! be driven with synthetic instants in tests.

mod frame_clock;
mod schedule;

pub use frame_clock::{FrameClock, FrameTime};
pub use schedule::FrameSchedule;
