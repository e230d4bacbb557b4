//! Shader sources, WGSL compile/link checks and the compile/link helpers used
//! by resource initialization.

mod compile;
mod interface;
mod source;

pub use compile::{compile_shader, link_program};
pub use interface::{CompiledStage, ProgramInterface, compile_wgsl, link_stages};
pub use source::{EmbeddedShaders, Overlay, ShaderDir, ShaderSource};
