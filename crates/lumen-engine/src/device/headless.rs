//! Off-screen backend.
//!
//! `HeadlessApi` keeps the full object semantics of [`ObjectTable`] but never
//! touches a GPU. Every call is appended to a log so callers can inspect
//! exactly what was issued and in which order.

use std::cell::RefCell;
use std::fmt;

use crate::coords::{Color, Viewport};
use crate::error::{ApiError, ContextError};

use super::api::{
    AttribLayout, BufferId, FrameStatus, GraphicsApi, Primitive, ProgramId, ShaderId, ShaderStage,
};
use super::context::{BackendRequest, Surface};
use super::objects::ObjectTable;

/// One issued graphics call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BeginFrame,
    EndFrame,
    ClearColor(Color),
    Clear,
    Viewport(Viewport),
    CreateShader(ShaderStage, Option<ShaderId>),
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(Option<ProgramId>),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    CreateBuffer(Option<BufferId>),
    BindBuffer(Option<BufferId>),
    BufferData(usize),
    DeleteBuffer(BufferId),
    EnableVertexAttribArray(u32),
    VertexAttribPointer(u32, AttribLayout),
    DrawArrays {
        mode: Primitive,
        first: u32,
        count: u32,
    },
}

/// Failures to inject into a [`HeadlessApi`].
#[derive(Debug, Copy, Clone, Default)]
pub struct Faults {
    pub shader_allocation: bool,
    pub program_allocation: bool,
    pub buffer_allocation: bool,
    /// Status returned by every `begin_frame` instead of `Ready`.
    pub frame: Option<FrameStatus>,
}

pub struct HeadlessApi {
    backend: BackendRequest,
    size: (u32, u32),
    objects: ObjectTable,
    calls: Vec<Call>,
    clear_color: Color,
    viewport: Viewport,
    in_frame: bool,
    frames_presented: u64,
    faults: Faults,
}

impl fmt::Debug for HeadlessApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessApi")
            .field("backend", &self.backend)
            .field("size", &self.size)
            .field("calls", &self.calls.len())
            .field("in_frame", &self.in_frame)
            .field("frames_presented", &self.frames_presented)
            .finish_non_exhaustive()
    }
}

impl HeadlessApi {
    pub fn new(backend: BackendRequest, width: u32, height: u32) -> Self {
        Self {
            backend,
            size: (width, height),
            objects: ObjectTable::new(),
            calls: Vec::new(),
            clear_color: Color::default(),
            viewport: Viewport::full(width, height),
            in_frame: false,
            frames_presented: 0,
            faults: Faults::default(),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn set_faults(&mut self, faults: Faults) {
        self.faults = faults;
    }

    pub fn backend(&self) -> BackendRequest {
        self.backend
    }

    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    /// Simulates the surface changing size. The viewport is left alone, as in GL.
    pub fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn current_clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn current_viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.objects.current_program()
    }

    pub fn bound_buffer(&self) -> Option<BufferId> {
        self.objects.array_buffer()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn live_shaders(&self) -> usize {
        self.objects.live_shaders()
    }

    pub fn live_programs(&self) -> usize {
        self.objects.live_programs()
    }

    pub fn live_buffers(&self) -> usize {
        self.objects.live_buffers()
    }
}

impl GraphicsApi for HeadlessApi {
    fn begin_frame(&mut self) -> FrameStatus {
        self.calls.push(Call::BeginFrame);
        let status = self.faults.frame.unwrap_or(FrameStatus::Ready);
        self.in_frame = status == FrameStatus::Ready;
        status
    }

    fn end_frame(&mut self) {
        self.calls.push(Call::EndFrame);
        if self.in_frame {
            self.frames_presented += 1;
        }
        self.in_frame = false;
    }

    fn clear_color(&mut self, color: Color) {
        self.calls.push(Call::ClearColor(color));
        self.clear_color = color;
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::Viewport(viewport));
        self.viewport = viewport;
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = if self.faults.shader_allocation {
            None
        } else {
            self.objects.create_shader(stage)
        };
        self.calls.push(Call::CreateShader(stage, id));
        id
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) -> Result<(), ApiError> {
        self.calls.push(Call::ShaderSource(shader));
        self.objects.shader_source(shader, source)
    }

    fn compile_shader(&mut self, shader: ShaderId) -> Result<(), ApiError> {
        self.calls.push(Call::CompileShader(shader));
        self.objects.compile_shader(shader)
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.objects.shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.objects.shader_info_log(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.push(Call::DeleteShader(shader));
        self.objects.delete_shader(shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = if self.faults.program_allocation {
            None
        } else {
            self.objects.create_program()
        };
        self.calls.push(Call::CreateProgram(id));
        id
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> Result<(), ApiError> {
        self.calls.push(Call::AttachShader(program, shader));
        self.objects.attach_shader(program, shader)
    }

    fn link_program(&mut self, program: ProgramId) -> Result<(), ApiError> {
        self.calls.push(Call::LinkProgram(program));
        self.objects.link_program(program)
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.objects.program_link_status(program)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.objects.program_info_log(program)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.objects.attrib_location(program, name)
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), ApiError> {
        self.calls.push(Call::UseProgram(program));
        self.objects.use_program(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(Call::DeleteProgram(program));
        self.objects.delete_program(program);
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        let id = if self.faults.buffer_allocation {
            None
        } else {
            self.objects.create_buffer()
        };
        self.calls.push(Call::CreateBuffer(id));
        id
    }

    fn bind_buffer(&mut self, buffer: Option<BufferId>) -> Result<(), ApiError> {
        self.calls.push(Call::BindBuffer(buffer));
        self.objects.bind_buffer(buffer)
    }

    fn buffer_data(&mut self, data: &[u8]) -> Result<(), ApiError> {
        self.calls.push(Call::BufferData(data.len()));
        self.objects.buffer_data(data.len()).map(|_| ())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::DeleteBuffer(buffer));
        self.objects.delete_buffer(buffer);
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) -> Result<(), ApiError> {
        self.calls.push(Call::EnableVertexAttribArray(location));
        self.objects.enable_vertex_attrib_array(location)
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        layout: AttribLayout,
    ) -> Result<(), ApiError> {
        self.calls.push(Call::VertexAttribPointer(location, layout));
        self.objects.vertex_attrib_pointer(location, layout)
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) -> Result<(), ApiError> {
        self.calls.push(Call::DrawArrays { mode, first, count });
        self.objects.draw_state(first, count)?;
        if !self.in_frame {
            return Err(ApiError::NoActiveFrame);
        }
        Ok(())
    }
}

/// Surface producing [`HeadlessApi`] contexts.
///
/// Individual backend requests can be refused to exercise fallback paths.
/// Every request is remembered, successful or not.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: (u32, u32),
    refused: Vec<BackendRequest>,
    requests: RefCell<Vec<BackendRequest>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            refused: Vec::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Refuses `request` with [`ContextError::Unavailable`].
    pub fn without(mut self, request: BackendRequest) -> Self {
        self.refused.push(request);
        self
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.borrow().clone()
    }
}

impl Surface for HeadlessSurface {
    type Context = HeadlessApi;

    fn request_context(&self, request: BackendRequest) -> Result<HeadlessApi, ContextError> {
        self.requests.borrow_mut().push(request);

        if self.refused.contains(&request) {
            return Err(ContextError::Unavailable {
                request,
                reason: "refused by headless surface".into(),
            });
        }
        let (w, h) = self.size;
        if w == 0 || h == 0 {
            return Err(ContextError::ZeroSizedSurface);
        }
        Ok(HeadlessApi::new(request, w, h))
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::triangle;

    // ── drawing ──────────────────────────────────────────────────────────

    #[test]
    fn draw_without_program_is_rejected() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 8, 8);
        let err = api.draw_arrays(Primitive::Triangles, 0, 3).unwrap_err();
        // Outside a frame too; the missing program is reported first.
        assert_eq!(err, ApiError::NoProgramInUse);
    }

    #[test]
    fn draw_outside_frame_is_rejected() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 8, 8);
        let resources = triangle::init(&mut api, &triangle::builtin_shaders()).unwrap();
        api.use_program(Some(resources.program)).unwrap();

        assert_eq!(api.draw_arrays(Primitive::Triangles, 0, 3), Err(ApiError::NoActiveFrame));

        assert_eq!(api.begin_frame(), FrameStatus::Ready);
        assert_eq!(api.draw_arrays(Primitive::Triangles, 0, 3), Ok(()));
        api.end_frame();

        assert_eq!(api.draw_arrays(Primitive::Triangles, 0, 3), Err(ApiError::NoActiveFrame));
        assert_eq!(api.frames_presented(), 1);
    }

    // ── frames ───────────────────────────────────────────────────────────

    #[test]
    fn debug_output_summarizes_state() {
        let mut api = HeadlessApi::new(BackendRequest::Legacy, 8, 8);
        api.clear();
        let text = format!("{api:?}");
        assert!(text.starts_with("HeadlessApi"), "{text}");
        assert!(text.contains("Legacy"), "{text}");
        assert!(text.contains("calls: 1"), "{text}");
    }

    #[test]
    fn frames_count_only_when_ready() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 8, 8);
        assert_eq!(api.begin_frame(), FrameStatus::Ready);
        api.end_frame();

        api.set_faults(Faults {
            frame: Some(FrameStatus::Skipped),
            ..Faults::default()
        });
        assert_eq!(api.begin_frame(), FrameStatus::Skipped);
        api.end_frame();

        assert_eq!(api.frames_presented(), 1);
    }

    #[test]
    fn allocation_faults_return_none() {
        let mut api = HeadlessApi::new(BackendRequest::Legacy, 8, 8).with_faults(Faults {
            shader_allocation: true,
            program_allocation: true,
            buffer_allocation: true,
            frame: None,
        });
        assert_eq!(api.create_shader(ShaderStage::Vertex), None);
        assert_eq!(api.create_program(), None);
        assert_eq!(api.create_buffer(), None);
        assert_eq!(api.calls().len(), 3);
    }

    #[test]
    fn viewport_starts_at_surface_size() {
        let api = HeadlessApi::new(BackendRequest::Primary, 320, 200);
        assert_eq!(api.current_viewport(), Viewport::full(320, 200));
    }
}
