use std::fmt;
use std::num::NonZeroU32;

use crate::coords::{Color, Viewport};
use crate::error::ApiError;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: NonZeroU32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

object_id!(
    /// Name of a shader object.
    ShaderId
);
object_id!(
    /// Name of a program object.
    ProgramId
);
object_id!(
    /// Name of a buffer object.
    BufferId
);

/// Pipeline stage a shader object compiles for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Primitive assembly mode for `draw_arrays`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Float vertex attribute layout inside the bound array buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttribLayout {
    /// Components per vertex, 1..=4.
    pub components: u8,
    /// Bytes between consecutive vertices; 0 means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u64,
}

impl AttribLayout {
    #[inline]
    pub const fn packed(components: u8) -> Self {
        Self { components, stride: 0, offset: 0 }
    }

    /// Stride with the "tightly packed" zero resolved.
    #[inline]
    pub fn effective_stride(self) -> u64 {
        if self.stride == 0 {
            self.components as u64 * std::mem::size_of::<f32>() as u64
        } else {
            self.stride as u64
        }
    }
}

/// Outcome of trying to start a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// A drawable is acquired; draw calls will land on screen.
    Ready,
    /// Transient problem (surface reconfigured, timeout, minimized); skip this tick.
    Skipped,
    /// The surface cannot be recovered.
    Lost,
}

/// GL-shaped drawing API consumed by the initializer, the frame driver and
/// the resize handler.
///
/// Object creation returns `None` when the object could not be allocated.
/// Deleting an unknown object is a no-op. Operations that GL reports through
/// its error flag return [`ApiError`] instead.
///
/// Draw calls are only valid between [`begin_frame`](Self::begin_frame)
/// returning [`FrameStatus::Ready`] and [`end_frame`](Self::end_frame).
pub trait GraphicsApi {
    fn begin_frame(&mut self) -> FrameStatus;
    fn end_frame(&mut self);

    fn clear_color(&mut self, color: Color);
    fn clear(&mut self);
    fn viewport(&mut self, viewport: Viewport);

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId>;
    fn shader_source(&mut self, shader: ShaderId, source: &str) -> Result<(), ApiError>;
    fn compile_shader(&mut self, shader: ShaderId) -> Result<(), ApiError>;
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Option<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> Result<(), ApiError>;
    fn link_program(&mut self, program: ProgramId) -> Result<(), ApiError>;
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), ApiError>;
    fn delete_program(&mut self, program: ProgramId);

    fn create_buffer(&mut self) -> Option<BufferId>;
    fn bind_buffer(&mut self, buffer: Option<BufferId>) -> Result<(), ApiError>;
    /// Replaces the contents of the bound array buffer.
    fn buffer_data(&mut self, data: &[u8]) -> Result<(), ApiError>;
    fn delete_buffer(&mut self, buffer: BufferId);

    fn enable_vertex_attrib_array(&mut self, location: u32) -> Result<(), ApiError>;
    /// Points `location` at the currently bound array buffer.
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        layout: AttribLayout,
    ) -> Result<(), ApiError>;

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) -> Result<(), ApiError>;
}
