//! Backend-independent object bookkeeping.
//!
//! Tracks names, shader/program/buffer objects, bindings and vertex attribute
//! state the way a GL context does. Backends layer GPU resources on top.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::ApiError;
use crate::shader::{CompiledStage, ProgramInterface, compile_wgsl, link_stages};

use super::api::{AttribLayout, BufferId, ProgramId, ShaderId, ShaderStage};

/// Number of vertex attribute slots.
pub const MAX_VERTEX_ATTRIBS: u32 = 16;

struct ShaderObject {
    stage: ShaderStage,
    source: Option<String>,
    compiled: Option<Arc<CompiledStage>>,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    linked: Option<LinkedProgram>,
    log: String,
}

/// Stages and interface captured when a program links successfully.
///
/// Deleting the shader objects afterwards does not affect a linked program.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    pub vertex: Arc<CompiledStage>,
    pub fragment: Arc<CompiledStage>,
    pub interface: ProgramInterface,
}

#[derive(Default)]
struct BufferObject {
    len: usize,
}

#[derive(Default)]
struct AttribState {
    enabled: bool,
    pointer: Option<(AttribLayout, BufferId)>,
}

/// An enabled attribute feeding the current program.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundAttrib {
    pub location: u32,
    pub layout: AttribLayout,
    pub buffer: BufferId,
}

/// Everything a backend needs to issue a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawState {
    pub program: ProgramId,
    /// Sorted by location.
    pub attribs: Vec<BoundAttrib>,
}

#[derive(Default)]
pub struct ObjectTable {
    last_name: u32,
    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, BufferObject>,
    array_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
    attribs: BTreeMap<u32, AttribState>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_name(&mut self) -> Option<NonZeroU32> {
        self.last_name = self.last_name.checked_add(1)?;
        NonZeroU32::new(self.last_name)
    }

    // ── shaders ──────────────────────────────────────────────────────────

    pub fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        let id = ShaderId::from_raw(self.next_name()?);
        self.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: None,
                compiled: None,
                log: String::new(),
            },
        );
        Some(id)
    }

    pub fn shader_source(&mut self, shader: ShaderId, source: &str) -> Result<(), ApiError> {
        let obj = self.shaders.get_mut(&shader).ok_or(ApiError::UnknownShader(shader))?;
        obj.source = Some(source.to_owned());
        Ok(())
    }

    pub fn compile_shader(&mut self, shader: ShaderId) -> Result<(), ApiError> {
        let obj = self.shaders.get_mut(&shader).ok_or(ApiError::UnknownShader(shader))?;
        let source = obj.source.as_deref().unwrap_or_default();

        match compile_wgsl(obj.stage, source) {
            Ok(stage) => {
                obj.compiled = Some(Arc::new(stage));
                obj.log.clear();
            }
            Err(log) => {
                log::debug!("{} shader {} failed to compile", obj.stage, shader.raw());
                obj.compiled = None;
                obj.log = log;
            }
        }
        Ok(())
    }

    pub fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(&shader)
            .is_some_and(|s| s.compiled.is_some())
    }

    pub fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if the shader existed.
    pub fn delete_shader(&mut self, shader: ShaderId) -> bool {
        self.shaders.remove(&shader).is_some()
    }

    // ── programs ─────────────────────────────────────────────────────────

    pub fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::from_raw(self.next_name()?);
        self.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    pub fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) -> Result<(), ApiError> {
        let stage = self
            .shaders
            .get(&shader)
            .ok_or(ApiError::UnknownShader(shader))?
            .stage;
        let shaders = &self.shaders;
        let obj = self
            .programs
            .get_mut(&program)
            .ok_or(ApiError::UnknownProgram(program))?;

        if obj.attached.contains(&shader) {
            return Err(ApiError::InvalidValue(format!(
                "shader {} is already attached",
                shader.raw()
            )));
        }
        let same_stage = obj
            .attached
            .iter()
            .any(|s| shaders.get(s).is_some_and(|o| o.stage == stage));
        if same_stage {
            return Err(ApiError::InvalidValue(format!(
                "a {stage} shader is already attached to program {}",
                program.raw()
            )));
        }

        obj.attached.push(shader);
        Ok(())
    }

    /// Links `program`; the outcome is reported through the link status and log.
    pub fn link_program(&mut self, program: ProgramId) -> Result<(), ApiError> {
        let attached = self
            .programs
            .get(&program)
            .ok_or(ApiError::UnknownProgram(program))?
            .attached
            .clone();

        let outcome = self.link_attached(&attached);
        let obj = self
            .programs
            .get_mut(&program)
            .ok_or(ApiError::UnknownProgram(program))?;

        match outcome {
            Ok(linked) => {
                obj.linked = Some(linked);
                obj.log.clear();
            }
            Err(log) => {
                log::debug!("program {} failed to link", program.raw());
                obj.linked = None;
                obj.log = log;
            }
        }
        Ok(())
    }

    fn link_attached(&self, attached: &[ShaderId]) -> Result<LinkedProgram, String> {
        let mut vertex = None;
        let mut fragment = None;

        for id in attached {
            let Some(obj) = self.shaders.get(id) else {
                return Err(format!("error: shader {} was deleted before linking", id.raw()));
            };
            let Some(compiled) = obj.compiled.clone() else {
                return Err(format!("error: {} shader {} is not compiled", obj.stage, id.raw()));
            };
            match obj.stage {
                ShaderStage::Vertex => vertex = Some(compiled),
                ShaderStage::Fragment => fragment = Some(compiled),
            }
        }

        let vertex = vertex.ok_or("error: no vertex shader attached")?;
        let fragment = fragment.ok_or("error: no fragment shader attached")?;
        let interface = link_stages(&vertex, &fragment)?;

        Ok(LinkedProgram {
            vertex,
            fragment,
            interface,
        })
    }

    pub fn program_link_status(&self, program: ProgramId) -> bool {
        self.linked(program).is_some()
    }

    pub fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    pub fn linked(&self, program: ProgramId) -> Option<&LinkedProgram> {
        self.programs.get(&program)?.linked.as_ref()
    }

    pub fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.linked(program)?.interface.attributes.get(name).copied()
    }

    pub fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), ApiError> {
        if let Some(id) = program {
            let obj = self.programs.get(&id).ok_or(ApiError::UnknownProgram(id))?;
            if obj.linked.is_none() {
                return Err(ApiError::ProgramNotLinked(id));
            }
        }
        self.current_program = program;
        Ok(())
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    /// Returns `true` if the program existed.
    pub fn delete_program(&mut self, program: ProgramId) -> bool {
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.programs.remove(&program).is_some()
    }

    // ── buffers ──────────────────────────────────────────────────────────

    pub fn create_buffer(&mut self) -> Option<BufferId> {
        let id = BufferId::from_raw(self.next_name()?);
        self.buffers.insert(id, BufferObject::default());
        Some(id)
    }

    pub fn bind_buffer(&mut self, buffer: Option<BufferId>) -> Result<(), ApiError> {
        if let Some(id) = buffer {
            if !self.buffers.contains_key(&id) {
                return Err(ApiError::UnknownBuffer(id));
            }
        }
        self.array_buffer = buffer;
        Ok(())
    }

    pub fn array_buffer(&self) -> Option<BufferId> {
        self.array_buffer
    }

    /// Records new contents for the bound buffer and returns its name.
    pub fn buffer_data(&mut self, len: usize) -> Result<BufferId, ApiError> {
        let id = self.array_buffer.ok_or(ApiError::NoBufferBound)?;
        let obj = self.buffers.get_mut(&id).ok_or(ApiError::UnknownBuffer(id))?;
        obj.len = len;
        Ok(id)
    }

    /// Returns `true` if the buffer existed.
    pub fn delete_buffer(&mut self, buffer: BufferId) -> bool {
        if self.array_buffer == Some(buffer) {
            self.array_buffer = None;
        }
        for attrib in self.attribs.values_mut() {
            if attrib.pointer.is_some_and(|(_, b)| b == buffer) {
                attrib.pointer = None;
            }
        }
        self.buffers.remove(&buffer).is_some()
    }

    // ── vertex attributes ────────────────────────────────────────────────

    fn check_location(location: u32) -> Result<(), ApiError> {
        if location >= MAX_VERTEX_ATTRIBS {
            return Err(ApiError::InvalidValue(format!(
                "attribute location {location} exceeds {MAX_VERTEX_ATTRIBS}"
            )));
        }
        Ok(())
    }

    pub fn enable_vertex_attrib_array(&mut self, location: u32) -> Result<(), ApiError> {
        Self::check_location(location)?;
        self.attribs.entry(location).or_default().enabled = true;
        Ok(())
    }

    pub fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        layout: AttribLayout,
    ) -> Result<(), ApiError> {
        Self::check_location(location)?;
        if !(1..=4).contains(&layout.components) {
            return Err(ApiError::InvalidValue(format!(
                "attribute size {} is not in 1..=4",
                layout.components
            )));
        }
        if layout.stride % 4 != 0 || layout.offset % 4 != 0 {
            return Err(ApiError::InvalidValue(
                "float attribute stride and offset must be multiples of 4".into(),
            ));
        }
        let buffer = self.array_buffer.ok_or(ApiError::NoBufferBound)?;
        self.attribs.entry(location).or_default().pointer = Some((layout, buffer));
        Ok(())
    }

    /// Resolves the current program and its attribute sources, and checks
    /// that `first..first + count` vertices fit in every source buffer.
    pub fn draw_state(&self, first: u32, count: u32) -> Result<DrawState, ApiError> {
        let program = self.current_program.ok_or(ApiError::NoProgramInUse)?;
        let linked = self.linked(program).ok_or(ApiError::ProgramNotLinked(program))?;

        let mut attribs = Vec::with_capacity(linked.interface.attributes.len());
        for (name, &location) in &linked.interface.attributes {
            let bound = self
                .attribs
                .get(&location)
                .filter(|a| a.enabled)
                .and_then(|a| a.pointer);
            let Some((layout, buffer)) = bound else {
                return Err(ApiError::MissingVertexAttribute {
                    name: name.clone(),
                    location,
                });
            };

            let len = self.buffers.get(&buffer).ok_or(ApiError::UnknownBuffer(buffer))?.len as u64;
            if count > 0 {
                let last = (first as u64 + count as u64 - 1) * layout.effective_stride();
                let end = layout.offset + last + layout.components as u64 * 4;
                if end > len {
                    return Err(ApiError::InvalidValue(format!(
                        "draw reads {end} bytes from buffer {} holding {len}",
                        buffer.raw()
                    )));
                }
            }

            attribs.push(BoundAttrib { location, layout, buffer });
        }
        attribs.sort_by_key(|a| a.location);

        Ok(DrawState { program, attribs })
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str =
        "@vertex fn vs_main(@location(0) a_vertex: vec4<f32>) -> @builtin(position) vec4<f32> { return a_vertex; }";
    const FS: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

    fn compiled(table: &mut ObjectTable, stage: ShaderStage, src: &str) -> ShaderId {
        let id = table.create_shader(stage).unwrap();
        table.shader_source(id, src).unwrap();
        table.compile_shader(id).unwrap();
        assert!(table.shader_compile_status(id), "{}", table.shader_info_log(id));
        id
    }

    fn linked_program(table: &mut ObjectTable) -> ProgramId {
        let vs = compiled(table, ShaderStage::Vertex, VS);
        let fs = compiled(table, ShaderStage::Fragment, FS);
        let p = table.create_program().unwrap();
        table.attach_shader(p, vs).unwrap();
        table.attach_shader(p, fs).unwrap();
        table.link_program(p).unwrap();
        assert!(table.program_link_status(p), "{}", table.program_info_log(p));
        p
    }

    #[test]
    fn names_are_unique_across_object_kinds() {
        let mut t = ObjectTable::new();
        let s = t.create_shader(ShaderStage::Vertex).unwrap();
        let p = t.create_program().unwrap();
        let b = t.create_buffer().unwrap();
        assert_ne!(s.raw(), p.raw());
        assert_ne!(p.raw(), b.raw());
    }

    #[test]
    fn compile_without_source_fails_with_log() {
        let mut t = ObjectTable::new();
        let s = t.create_shader(ShaderStage::Fragment).unwrap();
        t.compile_shader(s).unwrap();
        assert!(!t.shader_compile_status(s));
        assert!(!t.shader_info_log(s).is_empty());
    }

    #[test]
    fn second_shader_of_same_stage_is_rejected() {
        let mut t = ObjectTable::new();
        let a = compiled(&mut t, ShaderStage::Vertex, VS);
        let b = compiled(&mut t, ShaderStage::Vertex, VS);
        let p = t.create_program().unwrap();
        t.attach_shader(p, a).unwrap();
        assert!(matches!(t.attach_shader(p, b), Err(ApiError::InvalidValue(_))));
    }

    #[test]
    fn linked_program_survives_shader_deletion() {
        let mut t = ObjectTable::new();
        let p = linked_program(&mut t);
        // Both stage objects were created by `linked_program`; drop them all.
        for raw in 1..=2 {
            t.delete_shader(ShaderId::from_raw(NonZeroU32::new(raw).unwrap()));
        }
        assert_eq!(t.live_shaders(), 0);
        assert!(t.program_link_status(p));
        assert_eq!(t.attrib_location(p, "a_vertex"), Some(0));
    }

    #[test]
    fn link_fails_when_stage_missing() {
        let mut t = ObjectTable::new();
        let vs = compiled(&mut t, ShaderStage::Vertex, VS);
        let p = t.create_program().unwrap();
        t.attach_shader(p, vs).unwrap();
        t.link_program(p).unwrap();
        assert!(!t.program_link_status(p));
        assert!(t.program_info_log(p).contains("fragment"));
    }

    #[test]
    fn use_program_requires_linked_program() {
        let mut t = ObjectTable::new();
        let p = t.create_program().unwrap();
        assert_eq!(t.use_program(Some(p)), Err(ApiError::ProgramNotLinked(p)));
        assert_eq!(t.current_program(), None);
    }

    #[test]
    fn attrib_pointer_requires_bound_buffer() {
        let mut t = ObjectTable::new();
        assert_eq!(
            t.vertex_attrib_pointer(0, AttribLayout::packed(4)),
            Err(ApiError::NoBufferBound)
        );
    }

    #[test]
    fn attrib_pointer_rejects_misaligned_layout() {
        let mut t = ObjectTable::new();
        let b = t.create_buffer().unwrap();
        t.bind_buffer(Some(b)).unwrap();

        let misaligned = AttribLayout {
            components: 3,
            stride: 14,
            offset: 0,
        };
        assert!(matches!(t.vertex_attrib_pointer(0, misaligned), Err(ApiError::InvalidValue(_))));
        let misaligned = AttribLayout {
            components: 2,
            stride: 8,
            offset: 2,
        };
        assert!(matches!(t.vertex_attrib_pointer(0, misaligned), Err(ApiError::InvalidValue(_))));
        let padded = AttribLayout {
            components: 3,
            stride: 16,
            offset: 4,
        };
        assert!(t.vertex_attrib_pointer(0, padded).is_ok());
    }

    #[test]
    fn draw_state_reports_missing_attribute() {
        let mut t = ObjectTable::new();
        let p = linked_program(&mut t);
        t.use_program(Some(p)).unwrap();

        let err = t.draw_state(0, 3).unwrap_err();
        assert_eq!(
            err,
            ApiError::MissingVertexAttribute {
                name: "a_vertex".into(),
                location: 0,
            }
        );
    }

    #[test]
    fn draw_state_checks_buffer_range() {
        let mut t = ObjectTable::new();
        let p = linked_program(&mut t);
        let b = t.create_buffer().unwrap();
        t.bind_buffer(Some(b)).unwrap();
        t.buffer_data(3 * 4 * 4).unwrap();
        t.enable_vertex_attrib_array(0).unwrap();
        t.vertex_attrib_pointer(0, AttribLayout::packed(4)).unwrap();
        t.bind_buffer(None).unwrap();
        t.use_program(Some(p)).unwrap();

        let state = t.draw_state(0, 3).unwrap();
        assert_eq!(state.program, p);
        assert_eq!(
            state.attribs,
            vec![BoundAttrib {
                location: 0,
                layout: AttribLayout::packed(4),
                buffer: b,
            }]
        );

        assert!(matches!(t.draw_state(1, 3), Err(ApiError::InvalidValue(_))));
    }

    #[test]
    fn deleting_buffer_clears_bindings() {
        let mut t = ObjectTable::new();
        let b = t.create_buffer().unwrap();
        t.bind_buffer(Some(b)).unwrap();
        t.vertex_attrib_pointer(0, AttribLayout::packed(2)).unwrap();

        assert!(t.delete_buffer(b));
        assert_eq!(t.array_buffer(), None);
        assert!(!t.delete_buffer(b));
        assert_eq!(t.bind_buffer(Some(b)), Err(ApiError::UnknownBuffer(b)));
    }
}
