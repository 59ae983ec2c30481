use std::path::PathBuf;

use thiserror::Error;

use crate::engine::gpu::ShaderStage;
use crate::engine::shaders::UniformType;

/// Failures while turning GLSL sources into a linked program
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Failed to compile {stage} stage of shader {shader}: {log}")]
    Compile {
        shader: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("Failed to link shader {shader}: {log}")]
    Link { shader: String, log: String },
}

/// Misuse of a shader's uniform contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("{name} is not a required parameter for shader {shader}")]
    UnknownUniform { shader: String, name: String },

    #[error("Uniform {name} is declared as {expected} but was given a {actual} value")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        actual: UniformType,
    },
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("GPU rejected the resource: {0}")]
    Gpu(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Mesh {0} has no shader assigned")]
    MeshWithoutShader(String),

    #[error("Shader id {0} is not registered")]
    UnknownShader(usize),

    #[error("Mesh {0} has not been initialized")]
    NotInitialized(String),

    #[error("Mesh {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Mesh {0} was created with static usage and cannot be updated")]
    ImmutableMesh(String),

    #[error("Mesh {mesh} expects {expected} vertices, got {actual}")]
    VertexCountMismatch {
        mesh: String,
        expected: usize,
        actual: usize,
    },

    #[error("Shader {shader} has not set all required uniforms; skipped drawing {mesh}")]
    UnsatisfiedParameters { mesh: String, shader: String },

    #[error("GPU allocation failed: {0}")]
    Gpu(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
