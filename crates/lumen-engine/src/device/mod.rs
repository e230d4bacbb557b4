//! Drawing contexts.
//!
//! This module is responsible for:
//! - the GL-shaped [`GraphicsApi`] that the rest of the engine draws through
//! - acquiring a context from a surface, with a legacy-backend fallback
//! - the wgpu backend bound to a winit window, and an off-screen backend

mod api;
mod context;
mod error;
mod frame;
mod gpu;
mod headless;
mod init;
mod objects;
mod surface;
mod wgpu_api;

pub use api::{
    AttribLayout, BufferId, FrameStatus, GraphicsApi, Primitive, ProgramId, ShaderId, ShaderStage,
};
pub use context::{
    BackendPreference, BackendRequest, Surface, acquire_context, acquire_context_with,
};
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use headless::{Call, Faults, HeadlessApi, HeadlessSurface};
pub use init::GpuInit;
pub use objects::{BoundAttrib, DrawState, LinkedProgram, MAX_VERTEX_ATTRIBS, ObjectTable};
pub use surface::WindowSurface;
pub use wgpu_api::WgpuApi;
