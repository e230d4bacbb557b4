//! Small value types shared by the graphics API and the runtime.
//!
//! Viewports are in physical pixels of the drawing buffer, origin bottom-left
//! (GL convention). Backends with a top-left origin flip on submission.

mod color;
mod viewport;

pub use color::Color;
pub use viewport::Viewport;
