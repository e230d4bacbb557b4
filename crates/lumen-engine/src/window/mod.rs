//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the wgpu backend
//! and the frame driver.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
