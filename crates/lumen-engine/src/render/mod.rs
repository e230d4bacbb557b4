//! Drawable resources.
//!
//! Everything here goes through [`GraphicsApi`](crate::device::GraphicsApi),
//! so it runs unchanged on the wgpu and the headless backend.

mod resources;
pub mod triangle;

pub use resources::DrawResources;
