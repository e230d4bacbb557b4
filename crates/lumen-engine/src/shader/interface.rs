//! WGSL front-end checks backing `compile_shader` and `link_program`.
//!
//! Compiling parses and validates one stage's module. Linking matches the
//! vertex outputs against the fragment inputs by location, the same contract
//! GL enforces on varyings.

use std::collections::BTreeMap;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, Type, TypeInner};

use crate::device::ShaderStage;

/// A successfully compiled shader stage.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub source: String,
    pub entry_point: String,
    module: Module,
}

/// Vertex/fragment interface of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Vertex inputs by name.
    pub attributes: BTreeMap<String, u32>,
}

#[derive(Debug, Clone)]
struct IoSlot {
    name: Option<String>,
    location: u32,
    ty: TypeInner,
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates `source` as a `stage` shader.
///
/// On failure the returned string is the diagnostic, formatted for an info log.
pub fn compile_wgsl(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::default());
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = naga_stage(stage);
    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| format!("error: no @{stage} entry point"))?;

    Ok(CompiledStage {
        stage,
        source: source.to_owned(),
        entry_point,
        module,
    })
}

impl CompiledStage {
    fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }

    fn inputs(&self) -> Vec<IoSlot> {
        let mut out = Vec::new();
        if let Some(ep) = self.entry() {
            for arg in &ep.function.arguments {
                collect_slots(
                    &self.module,
                    arg.ty,
                    arg.binding.as_ref(),
                    arg.name.as_deref(),
                    &mut out,
                );
            }
        }
        out
    }

    fn outputs(&self) -> Vec<IoSlot> {
        let mut out = Vec::new();
        if let Some(result) = self.entry().and_then(|ep| ep.function.result.as_ref()) {
            collect_slots(&self.module, result.ty, result.binding.as_ref(), None, &mut out);
        }
        out
    }
}

/// Flattens a bound argument/result (or a struct of bound members) into
/// location slots. Built-ins are skipped.
fn collect_slots(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<IoSlot>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(IoSlot {
            name: name.map(str::to_owned),
            location: *location,
            ty: module.types[ty].inner.clone(),
        }),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_slots(module, m.ty, m.binding.as_ref(), m.name.as_deref(), out);
                }
            }
        }
    }
}

fn io_types_match(a: &TypeInner, b: &TypeInner) -> bool {
    let simple = |t: &TypeInner| matches!(t, TypeInner::Scalar(_) | TypeInner::Vector { .. });
    if simple(a) && simple(b) { a == b } else { true }
}

/// Checks that `vertex` feeds every input `fragment` reads.
///
/// On failure the returned string is the link log.
pub fn link_stages(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
) -> Result<ProgramInterface, String> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(format!("error: expected a vertex shader, got {}", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(format!("error: expected a fragment shader, got {}", fragment.stage));
    }

    let produced = vertex.outputs();
    for input in fragment.inputs() {
        let label = input.name.as_deref().unwrap_or("<unnamed>");
        let Some(output) = produced.iter().find(|o| o.location == input.location) else {
            return Err(format!(
                "error: fragment input '{label}' at location {} is not written by the vertex shader",
                input.location
            ));
        };
        if !io_types_match(&output.ty, &input.ty) {
            return Err(format!(
                "error: type mismatch at location {} between vertex output and fragment input '{label}'",
                input.location
            ));
        }
    }

    let attributes = vertex
        .inputs()
        .into_iter()
        .filter_map(|slot| slot.name.map(|n| (n, slot.location)))
        .collect();

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) tint: vec3<f32>,
};

@vertex
fn vs_main(@location(0) a_vertex: vec4<f32>, @location(1) a_tint: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.position = a_vertex;
    out.tint = a_tint;
    return out;
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main(@location(0) tint: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(tint, 1.0);
}
"#;

    #[test]
    fn compile_finds_stage_entry_point() {
        let vs = compile_wgsl(ShaderStage::Vertex, VS).unwrap();
        assert_eq!(vs.entry_point, "vs_main");
    }

    #[test]
    fn compile_rejects_wrong_stage() {
        let err = compile_wgsl(ShaderStage::Fragment, VS).unwrap_err();
        assert!(err.contains("@fragment"), "{err}");
    }

    #[test]
    fn compile_reports_syntax_errors() {
        let err = compile_wgsl(ShaderStage::Vertex, "fn broken( {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn link_collects_named_attributes() {
        let vs = compile_wgsl(ShaderStage::Vertex, VS).unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, FS).unwrap();
        let iface = link_stages(&vs, &fs).unwrap();

        assert_eq!(iface.vertex_entry, "vs_main");
        assert_eq!(iface.fragment_entry, "fs_main");
        assert_eq!(iface.attributes.get("a_vertex"), Some(&0));
        assert_eq!(iface.attributes.get("a_tint"), Some(&1));
    }

    #[test]
    fn link_rejects_unwritten_fragment_input() {
        let vs = compile_wgsl(
            ShaderStage::Vertex,
            "@vertex fn main(@location(0) p: vec4<f32>) -> @builtin(position) vec4<f32> { return p; }",
        )
        .unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, FS).unwrap();

        let log = link_stages(&vs, &fs).unwrap_err();
        assert!(log.contains("location 0"), "{log}");
    }

    #[test]
    fn link_rejects_mismatched_varying_types() {
        let vs = compile_wgsl(ShaderStage::Vertex, VS).unwrap();
        let fs = compile_wgsl(
            ShaderStage::Fragment,
            "@fragment fn main(@location(0) t: vec2<f32>) -> @location(0) vec4<f32> { return vec4<f32>(t, 0.0, 1.0); }",
        )
        .unwrap();

        let log = link_stages(&vs, &fs).unwrap_err();
        assert!(log.contains("type mismatch"), "{log}");
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vs = compile_wgsl(ShaderStage::Vertex, VS).unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, FS).unwrap();
        assert!(link_stages(&fs, &vs).is_err());
    }
}
