//! On-screen backend: [`GraphicsApi`] on top of wgpu.
//!
//! Object state lives in [`ObjectTable`]. GPU resources are materialized as
//! late as possible: shader modules when a program links, vertex buffers on
//! upload, render pipelines on the first draw with a given program, primitive
//! and attribute layout.

use std::collections::HashMap;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::{Color, Viewport};
use crate::error::{ApiError, ContextError};
use crate::shader::CompiledStage;

use super::api::{
    AttribLayout, BufferId, FrameStatus, GraphicsApi, Primitive, ProgramId, ShaderId, ShaderStage,
};
use super::context::BackendRequest;
use super::objects::ObjectTable;
use super::{Gpu, GpuFrame, GpuInit};

struct ProgramModules {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    mode: Primitive,
    attribs: Vec<(u32, AttribLayout)>,
}

pub struct WgpuApi<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,
    backend: BackendRequest,

    objects: ObjectTable,
    clear_color: Color,
    viewport: Viewport,

    modules: HashMap<ProgramId, ProgramModules>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    /// Frame being recorded between `begin_frame` and `end_frame`.
    frame: Option<GpuFrame>,
}

impl<'w> WgpuApi<'w> {
    /// Creates a context for `window` restricted to the backends of `request`.
    pub fn new(
        window: &'w Window,
        init: GpuInit,
        request: BackendRequest,
    ) -> Result<Self, ContextError> {
        let gpu = pollster::block_on(Gpu::new(window, init, request))?;
        let size = gpu.size();

        Ok(Self {
            window,
            gpu,
            backend: request,
            objects: ObjectTable::new(),
            clear_color: Color::default(),
            viewport: Viewport::full(size.width, size.height),
            modules: HashMap::new(),
            buffers: HashMap::new(),
            pipelines: HashMap::new(),
            frame: None,
        })
    }

    pub fn backend(&self) -> BackendRequest {
        self.backend
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Follows a change of the window's backing-buffer size.
    ///
    /// Only the surface is reconfigured; the viewport is left to the caller.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    fn forget_pipelines(&mut self, program: ProgramId) {
        self.pipelines.retain(|key, _| key.program != program);
    }

    fn build_pipeline(&self, key: &PipelineKey) -> Result<wgpu::RenderPipeline, ApiError> {
        let modules = self
            .modules
            .get(&key.program)
            .ok_or(ApiError::ProgramNotLinked(key.program))?;

        // One buffer slot per attribute; the slot offset is applied when binding.
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .attribs
            .iter()
            .map(|&(location, layout)| {
                [wgpu::VertexAttribute {
                    format: vertex_format(layout.components),
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .attribs
            .iter()
            .zip(&attributes)
            .map(|(&(_, layout), attrs)| wgpu::VertexBufferLayout {
                array_stride: layout.effective_stride(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("lumen program pipeline"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &modules.vertex,
                    entry_point: Some(modules.vertex_entry.as_str()),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &modules.fragment,
                    entry_point: Some(modules.fragment_entry.as_str()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.surface_format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology(key.mode),
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!(
            "built pipeline for program {} ({:?}, {} attribute(s))",
            key.program.raw(),
            key.mode,
            key.attribs.len()
        );
        Ok(pipeline)
    }
}

fn shader_module(device: &wgpu::Device, stage: &CompiledStage) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(match stage.stage {
            ShaderStage::Vertex => "lumen vertex shader",
            ShaderStage::Fragment => "lumen fragment shader",
        }),
        source: wgpu::ShaderSource::Wgsl(stage.source.as_str().into()),
    })
}

fn vertex_format(components: u8) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn topology(mode: Primitive) -> wgpu::PrimitiveTopology {
    match mode {
        Primitive::Points => wgpu::PrimitiveTopology::PointList,
        Primitive::Lines => wgpu::PrimitiveTopology::LineList,
        Primitive::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

impl GraphicsApi for WgpuApi<'_> {
    fn begin_frame(&mut self) -> FrameStatus {
        if self.frame.is_some() {
            return FrameStatus::Ready;
        }

        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            // Minimized; the surface stays unconfigured until it has an area again.
            return FrameStatus::Skipped;
        }

        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                FrameStatus::Ready
            }
            Err(err) => {
                log::debug!("frame acquisition failed: {err}");
                self.gpu.handle_surface_error(err).into()
            }
        }
    }

    fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.window.pre_present_notify();
            self.gpu.submit(frame);
        }
    }

    fn clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear(&mut self) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("clear issued outside of a frame; ignored");
            return;
        };

        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        self.objects.create_shader(stage)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) -> Result<(), ApiError> {
        self.objects.shader_source(shader, source)
    }

    fn compile_shader(&mut self, shader: ShaderId) -> Result<(), ApiError> {
        self.objects.compile_shader(shader)
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.objects.shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.objects.shader_info_log(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.objects.delete_shader(shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        self.objects.create_program()
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> Result<(), ApiError> {
        self.objects.attach_shader(program, shader)
    }

    fn link_program(&mut self, program: ProgramId) -> Result<(), ApiError> {
        self.objects.link_program(program)?;
        self.forget_pipelines(program);

        match self.objects.linked(program) {
            Some(linked) => {
                let device = self.gpu.device();
                let modules = ProgramModules {
                    vertex: shader_module(device, &linked.vertex),
                    fragment: shader_module(device, &linked.fragment),
                    vertex_entry: linked.interface.vertex_entry.clone(),
                    fragment_entry: linked.interface.fragment_entry.clone(),
                };
                self.modules.insert(program, modules);
            }
            None => {
                self.modules.remove(&program);
            }
        }
        Ok(())
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
        self.objects.use_program(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.objects.delete_program(program) {
            self.modules.remove(&program);
            self.forget_pipelines(program);
        }
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        self.objects.create_buffer()
    }

    fn bind_buffer(&mut self, buffer: Option<BufferId>) -> Result<(), ApiError> {
        self.objects.bind_buffer(buffer)
    }

    fn buffer_data(&mut self, data: &[u8]) -> Result<(), ApiError> {
        let id = self.objects.buffer_data(data.len())?;
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen array buffer"),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        self.buffers.insert(id, buffer);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.objects.delete_buffer(buffer);
        self.buffers.remove(&buffer);
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) -> Result<(), ApiError> {
        self.objects.enable_vertex_attrib_array(location)
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        layout: AttribLayout,
    ) -> Result<(), ApiError> {
        self.objects.vertex_attrib_pointer(location, layout)
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) -> Result<(), ApiError> {
        let state = self.objects.draw_state(first, count)?;
        if self.frame.is_none() {
            return Err(ApiError::NoActiveFrame);
        }
        if count == 0 {
            return Ok(());
        }

        let size = self.gpu.size();
        let Some((x, y, w, h)) = self.viewport.to_top_left_within(size.width, size.height) else {
            // Degenerate or off-surface viewport: nothing is rasterized.
            return Ok(());
        };

        let key = PipelineKey {
            program: state.program,
            mode,
            attribs: state.attribs.iter().map(|a| (a.location, a.layout)).collect(),
        };
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.build_pipeline(&key)?;
            self.pipelines.insert(key.clone(), pipeline);
        }
        let pipeline = self
            .pipelines
            .get(&key)
            .ok_or(ApiError::ProgramNotLinked(state.program))?;

        let mut slices = Vec::with_capacity(state.attribs.len());
        for attrib in &state.attribs {
            let buffer = self
                .buffers
                .get(&attrib.buffer)
                .ok_or(ApiError::UnknownBuffer(attrib.buffer))?;
            slices.push(buffer.slice(attrib.layout.offset..));
        }

        let Some(frame) = self.frame.as_mut() else {
            return Err(ApiError::NoActiveFrame);
        };
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_viewport(x, y, w, h, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        for (slot, slice) in slices.into_iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, slice);
        }
        pass.draw(first..first + count, 0..1);
        Ok(())
    }
}
