//! Lumen engine crate.
//!
//! A GL-shaped drawing API over wgpu, the pieces that start a program on it
//! (context acquisition, shader compile and link, vertex upload) and the
//! runtime that drives it at a fixed tick rate.

pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod render;
pub mod shader;
pub mod time;
pub mod window;
