//! Narrow view of the OpenGL API used by the engine.
//!
//! Everything that touches the GPU goes through [`GraphicsDevice`]. The real
//! implementation is `glow::Context`; unit tests swap in a recording device.

use std::fmt;
use std::num::NonZeroU32;

#[cfg(not(target_arch = "wasm32"))]
mod glow_device;
#[cfg(test)]
pub(crate) mod recording;

/// Handle to a compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub NonZeroU32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub NonZeroU32);

/// Handle to a vertex or element buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub NonZeroU32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub NonZeroU32);

/// Handle to a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub NonZeroU32);

/// Location of an active uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Triangle index data
    ElementArray,
}

/// Allocation hint passed to the driver when a buffer store is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
    Blend,
    CullFace,
}

/// The OpenGL calls the engine relies on.
///
/// Methods mirror `glow::HasContext` but take the engine's handle types, so the
/// same code paths run against a real context or a test double. All calls must
/// happen on the thread that owns the context.
pub trait GraphicsDevice {
    // Shaders & programs
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;
    fn delete_shader(&self, shader: ShaderHandle);
    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, String>;
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: Option<ProgramHandle>);
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    // Uniform uploads (for the currently bound program)
    fn uniform_1_i32(&self, location: UniformLocation, value: i32);
    fn uniform_1_f32(&self, location: UniformLocation, value: f32);
    fn uniform_3_f32(&self, location: UniformLocation, value: [f32; 3]);
    fn uniform_4_f32(&self, location: UniformLocation, value: [f32; 4]);
    /// Uploads a column-major 4x4 matrix
    fn uniform_matrix_4_f32(&self, location: UniformLocation, value: &[f32; 16]);

    // Vertex arrays & buffers
    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn create_buffer(&self) -> Result<BufferHandle, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Allocates an uninitialized store of `size` bytes for the bound buffer
    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage);
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);
    /// Maps the bound buffer for writing, copies `data` to its start and unmaps it.
    /// Returns false when the driver refused the mapping.
    fn write_mapped(&self, target: BufferTarget, data: &[u8]) -> bool;
    fn delete_buffer(&self, buffer: BufferHandle);
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Float attribute pointer; `stride` and `offset` are in bytes
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);

    // Textures
    fn create_texture(&self) -> Result<TextureHandle, String>;
    fn upload_texture_rgba8(&self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]);
    fn bind_texture(&self, unit: u32, texture: Option<TextureHandle>);
    fn delete_texture(&self, texture: TextureHandle);

    // Pipeline state & drawing
    fn viewport(&self, width: i32, height: i32);
    fn set_capability(&self, capability: Capability, enabled: bool);
    /// Standard alpha blending (src_alpha, one_minus_src_alpha)
    fn blend_alpha(&self);
    fn clear(&self, color: Option<[f32; 4]>, depth: bool);
    /// Indexed triangle draw over `index_count` u32 indices of the bound vertex array
    fn draw_elements(&self, index_count: i32);
}
