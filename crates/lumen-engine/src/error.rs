//! Error types for context acquisition, resource initialization and the
//! graphics API itself.
//!
//! Everything on the initialization path reports through `Result`; there are
//! no sentinel handles.

use thiserror::Error;

use crate::device::{BackendRequest, BufferId, ProgramId, ShaderId, ShaderStage};

/// Invalid use of the graphics API (GL's `INVALID_OPERATION`/`INVALID_VALUE`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("unknown shader {0:?}")]
    UnknownShader(ShaderId),

    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramId),

    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("program {0:?} is not linked")]
    ProgramNotLinked(ProgramId),

    #[error("no program in use")]
    NoProgramInUse,

    #[error("no buffer bound to the array buffer target")]
    NoBufferBound,

    #[error("draw issued outside of a frame")]
    NoActiveFrame,

    #[error("vertex attribute '{name}' (location {location}) has no enabled buffer")]
    MissingVertexAttribute { name: String, location: u32 },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Failure to obtain a drawing context for a surface.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The requested backend is not offered by this surface/platform.
    #[error("{request} backend unavailable: {reason}")]
    Unavailable {
        request: BackendRequest,
        reason: String,
    },

    /// Every attempted backend was unavailable.
    #[error("no graphics backend available (tried {attempts:?})")]
    NoBackendAvailable { attempts: Vec<BackendRequest> },

    #[error("failed to create drawing surface: {0}")]
    Surface(String),

    #[error("drawing surface has zero size")]
    ZeroSizedSurface,

    #[error("failed to create device: {0}")]
    Device(String),
}

/// Failure while compiling shaders, linking the program or uploading vertex data.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("can not create {0} shader object")]
    ShaderCreationFailed(ShaderStage),

    #[error("shader source '{0}' not found")]
    ShaderSourceNotFound(String),

    #[error("failed to compile {stage} shader '{id}':\n{log}")]
    ShaderCompileError {
        id: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("can not create program object")]
    ProgramCreationFailed,

    #[error("failed to link program:\n{log}")]
    ProgramLinkError { log: String },

    #[error("attribute '{0}' is not an active vertex input")]
    MissingAttribute(String),

    #[error("can not create buffer object")]
    BufferCreationFailed,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Any failure before the frame driver starts running.
#[derive(Debug, Error)]
pub enum LumenError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Init(#[from] InitError),
}
