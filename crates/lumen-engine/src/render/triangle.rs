//! The red triangle: shaders, vertex data and their upload.

use crate::device::{AttribLayout, BufferId, GraphicsApi, ShaderStage};
use crate::error::{ApiError, InitError};
use crate::shader::{EmbeddedShaders, ShaderSource, compile_shader, link_program};

use super::DrawResources;

pub const VERTEX_SHADER_ID: &str = "vertex_shader";
pub const FRAGMENT_SHADER_ID: &str = "fragment_shader";

/// Vertex input the position data is fed to.
pub const POSITION_ATTRIBUTE: &str = "a_vertex";

/// Three clip-space vertices, `(x, y, z, w)` each.
#[rustfmt::skip]
pub const TRIANGLE_VERTICES: [f32; 12] = [
    -0.5, 0.0, 0.0, 1.0,
     0.5, 0.0, 0.0, 1.0,
     0.0, 0.5, 0.0, 1.0,
];

const COMPONENTS: u8 = 4;

/// WGSL compiled into the binary under [`VERTEX_SHADER_ID`] and
/// [`FRAGMENT_SHADER_ID`].
pub fn builtin_shaders() -> EmbeddedShaders {
    EmbeddedShaders::new()
        .with(VERTEX_SHADER_ID, include_str!("shaders/vertex_shader.wgsl"))
        .with(FRAGMENT_SHADER_ID, include_str!("shaders/fragment_shader.wgsl"))
}

/// Compiles and links the triangle program and uploads its vertices.
///
/// Shader objects never outlive this call. On error, every object created
/// so far has been deleted.
pub fn init<A, S>(api: &mut A, sources: &S) -> Result<DrawResources, InitError>
where
    A: GraphicsApi + ?Sized,
    S: ShaderSource + ?Sized,
{
    let vertex = compile_shader(api, sources, VERTEX_SHADER_ID, ShaderStage::Vertex)?;
    let fragment = match compile_shader(api, sources, FRAGMENT_SHADER_ID, ShaderStage::Fragment) {
        Ok(fragment) => fragment,
        Err(e) => {
            api.delete_shader(vertex);
            return Err(e);
        }
    };

    let linked = link_program(api, vertex, fragment);
    api.delete_shader(vertex);
    api.delete_shader(fragment);
    let program = linked?;

    let Some(location) = api.attrib_location(program, POSITION_ATTRIBUTE) else {
        api.delete_program(program);
        log::error!("program has no '{POSITION_ATTRIBUTE}' vertex input");
        return Err(InitError::MissingAttribute(POSITION_ATTRIBUTE.to_owned()));
    };

    let Some(buffer) = api.create_buffer() else {
        api.delete_program(program);
        return Err(InitError::BufferCreationFailed);
    };

    if let Err(e) = upload_vertices(api, buffer, location) {
        // Deleting the buffer also unbinds it.
        api.delete_buffer(buffer);
        api.delete_program(program);
        return Err(e.into());
    }

    log::info!(
        "triangle ready: program {}, buffer {}, '{POSITION_ATTRIBUTE}' at location {location}",
        program.raw(),
        buffer.raw()
    );

    Ok(DrawResources {
        program,
        buffer,
        vertex_count: (TRIANGLE_VERTICES.len() / COMPONENTS as usize) as u32,
    })
}

fn upload_vertices<A>(api: &mut A, buffer: BufferId, location: u32) -> Result<(), ApiError>
where
    A: GraphicsApi + ?Sized,
{
    api.bind_buffer(Some(buffer))?;
    api.buffer_data(bytemuck::cast_slice(&TRIANGLE_VERTICES))?;
    api.enable_vertex_attrib_array(location)?;
    api.vertex_attrib_pointer(location, AttribLayout::packed(COMPONENTS))?;
    api.bind_buffer(None)
}
