//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the programs built on it: the [`App`] trait, the per-tick [`FrameDriver`],
//! resize handling and the startup sequence.

mod app;
mod bootstrap;
mod driver;
mod resize;

pub use app::{App, AppControl};
pub use bootstrap::bootstrap;
pub use driver::{DriverState, FrameDriver};
pub use resize::reshape;
