use crate::device::{GraphicsApi, ProgramId, ShaderId, ShaderStage};
use crate::error::InitError;

use super::ShaderSource;

/// Creates a `stage` shader object from the text registered under `id` and
/// compiles it.
///
/// Every failure after the object was created releases it before returning.
pub fn compile_shader<A, S>(
    api: &mut A,
    sources: &S,
    id: &str,
    stage: ShaderStage,
) -> Result<ShaderId, InitError>
where
    A: GraphicsApi + ?Sized,
    S: ShaderSource + ?Sized,
{
    let shader = api
        .create_shader(stage)
        .ok_or(InitError::ShaderCreationFailed(stage))?;

    let Some(text) = sources.source(id) else {
        api.delete_shader(shader);
        return Err(InitError::ShaderSourceNotFound(id.to_owned()));
    };

    let compiled = api
        .shader_source(shader, &text)
        .and_then(|()| api.compile_shader(shader));
    if let Err(e) = compiled {
        api.delete_shader(shader);
        return Err(e.into());
    }

    if !api.shader_compile_status(shader) {
        let log = api.shader_info_log(shader);
        api.delete_shader(shader);
        log::error!("{stage} shader '{id}' failed to compile:\n{log}");
        return Err(InitError::ShaderCompileError {
            id: id.to_owned(),
            stage,
            log,
        });
    }

    log::debug!("compiled {stage} shader '{id}' as {}", shader.raw());
    Ok(shader)
}

/// Links a vertex and a fragment shader into a program.
///
/// On failure the partially built program is released. The shader objects are
/// left to the caller, who should release them whatever the outcome.
pub fn link_program<A>(
    api: &mut A,
    vertex: ShaderId,
    fragment: ShaderId,
) -> Result<ProgramId, InitError>
where
    A: GraphicsApi + ?Sized,
{
    let program = api.create_program().ok_or(InitError::ProgramCreationFailed)?;

    let linked = api
        .attach_shader(program, vertex)
        .and_then(|()| api.attach_shader(program, fragment))
        .and_then(|()| api.link_program(program));
    if let Err(e) = linked {
        api.delete_program(program);
        return Err(e.into());
    }

    if !api.program_link_status(program) {
        let log = api.program_info_log(program);
        api.delete_program(program);
        log::error!("program failed to link:\n{log}");
        return Err(InitError::ProgramLinkError { log });
    }

    log::debug!("linked program {}", program.raw());
    Ok(program)
}
