use std::collections::BTreeMap;

use glam::Vec3;
use log::{debug, error, warn};

use super::{Face, Transform, Vertex, VertexShape};
use crate::engine::errors::{ContractError, RenderError};
use crate::engine::gpu::{
    BufferHandle, BufferTarget, BufferUsage, GraphicsDevice, TextureHandle, VertexArrayHandle,
};
use crate::engine::loaders::ImportedGeometry;
use crate::engine::managers::ShaderId;
use crate::engine::shaders::{ShaderContract, UniformValue, VertexAttribute};
use crate::engine::utils::{compute_normals, NormalMode};

/// Uniform fed from the mesh's transform when the shader declares it
pub const MODEL_UNIFORM: &str = "model";

/// How often vertex data is expected to change after `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshUsage {
    /// Uploaded once
    #[default]
    Static,
    /// Rewritten occasionally with `update_vertices`
    Dynamic,
    /// Rewritten most frames; uploads go through a mapped buffer
    Stream,
}

impl MeshUsage {
    fn buffer_usage(self) -> BufferUsage {
        match self {
            MeshUsage::Static => BufferUsage::StaticDraw,
            MeshUsage::Dynamic => BufferUsage::DynamicDraw,
            MeshUsage::Stream => BufferUsage::StreamDraw,
        }
    }

    pub fn is_mutable(self) -> bool {
        self != MeshUsage::Static
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshBuffers {
    vertex_array: VertexArrayHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: i32,
}

/// Texture bound to a unit before each draw. The mesh does not own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub unit: u32,
    pub texture: TextureHandle,
}

/// Indexed triangle geometry plus the per-mesh uniform values it needs.
///
/// The vertex layout is fixed from the first vertex: position, then texture
/// coordinate and normal if present. GPU buffers exist between `init` and
/// `cleanup`.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    shape: VertexShape,
    derived_normals: Option<NormalMode>,
    usage: MeshUsage,
    shader: Option<ShaderId>,
    params: BTreeMap<String, UniformValue>,
    texture: Option<TextureBinding>,
    transform: Transform,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Faces that reference missing vertices are dropped with a warning
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let name = name.into();
        let shape = vertices.first().map(Vertex::shape).unwrap_or_default();

        let total = faces.len();
        let faces: Vec<Face> = faces
            .into_iter()
            .filter(|face| face.iter().all(|&i| (i as usize) < vertices.len()))
            .collect();
        if faces.len() < total {
            warn!(
                "Mesh {}: {} faces skipped due to out of bounds indices",
                name,
                total - faces.len()
            );
        }
        if vertices.iter().any(|v| v.shape() != shape) {
            warn!("Mesh {}: vertices carry differing attributes; layout follows the first vertex", name);
        }

        Self {
            name,
            vertices,
            faces,
            shape,
            derived_normals: None,
            usage: MeshUsage::Static,
            shader: None,
            params: BTreeMap::new(),
            texture: None,
            transform: Transform::identity(),
            buffers: None,
        }
    }

    pub fn from_geometry(name: impl Into<String>, geometry: &ImportedGeometry) -> Self {
        let mut mesh = Self::new(name, geometry.vertices.clone(), geometry.faces.clone());
        mesh.derived_normals = geometry.derived_normals;
        mesh
    }

    /// Replaces normals with derived ones and keeps deriving them on every vertex update
    pub fn with_derived_normals(mut self, mode: NormalMode) -> Self {
        self.vertices = compute_normals(&self.vertices, &self.faces, mode);
        self.shape = self.vertices.first().map(Vertex::shape).unwrap_or(self.shape);
        self.derived_normals = Some(mode);
        self
    }

    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    /// Attribute locations are wired during `init`, so the shader can only
    /// change before it.
    pub fn set_shader(&mut self, shader: ShaderId) -> Result<(), RenderError> {
        if self.buffers.is_some() {
            error!("Mesh {} is already initialized; its shader cannot change", self.name);
            return Err(RenderError::AlreadyInitialized(self.name.clone()));
        }
        self.shader = Some(shader);
        Ok(())
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn shape(&self) -> VertexShape {
        self.shape
    }

    pub fn usage(&self) -> MeshUsage {
        self.usage
    }

    pub fn is_initialized(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn set_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.texture = Some(TextureBinding { unit, texture });
    }

    pub fn param(&self, name: &str) -> Option<UniformValue> {
        self.params.get(name).copied()
    }

    /// Creates the vertex array, vertex buffer and index buffer.
    ///
    /// Attributes are wired to the locations `contract` declares; inputs the
    /// shader does not declare are left disabled.
    pub fn init(
        &mut self,
        gl: &dyn GraphicsDevice,
        contract: &ShaderContract,
        usage: MeshUsage,
    ) -> Result<(), RenderError> {
        if self.buffers.is_some() {
            return Err(RenderError::AlreadyInitialized(self.name.clone()));
        }

        let vertex_array = gl.create_vertex_array().map_err(RenderError::Gpu)?;
        let vertex_buffer = gl.create_buffer().map_err(RenderError::Gpu)?;
        let index_buffer = gl.create_buffer().map_err(RenderError::Gpu)?;
        self.usage = usage;

        gl.bind_vertex_array(Some(vertex_array));

        let data = self.shape.interleave(&self.vertices);
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        gl.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        gl.buffer_data_size(BufferTarget::Array, bytes.len(), usage.buffer_usage());
        self.write_vertex_bytes(gl, bytes);

        gl.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        gl.buffer_data(
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&self.faces),
            BufferUsage::StaticDraw,
        );

        self.bind_attributes(gl, contract);

        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::Array, None);

        self.buffers = Some(MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: (self.faces.len() * 3) as i32,
        });
        debug!(
            "Initialized mesh {} ({} vertices, {} triangles, {:?})",
            self.name,
            self.vertices.len(),
            self.faces.len(),
            usage
        );
        Ok(())
    }

    fn bind_attributes(&self, gl: &dyn GraphicsDevice, contract: &ShaderContract) {
        let stride = self.shape.byte_stride() as i32;
        let float_size = std::mem::size_of::<f32>();
        let layout = [
            (VertexAttribute::Position, Some(0)),
            (VertexAttribute::TextureCoord, self.shape.texture_offset()),
            (VertexAttribute::Normal, self.shape.normal_offset()),
        ];

        for (attribute, offset) in layout {
            match (contract.attribute_location(attribute), offset) {
                (Some(location), Some(offset)) => {
                    gl.enable_vertex_attrib_array(location);
                    gl.vertex_attrib_pointer_f32(
                        location,
                        attribute.components(),
                        stride,
                        (offset * float_size) as i32,
                    );
                }
                (Some(location), None) => warn!(
                    "Shader {} expects a {} input at location {} but mesh {} has none",
                    contract.name(),
                    attribute,
                    location,
                    self.name
                ),
                (None, _) => {}
            }
        }
    }

    fn write_vertex_bytes(&self, gl: &dyn GraphicsDevice, bytes: &[u8]) {
        if self.usage == MeshUsage::Stream && gl.write_mapped(BufferTarget::Array, bytes) {
            return;
        }
        gl.buffer_sub_data(BufferTarget::Array, 0, bytes);
    }

    /// Replaces vertex positions and re-uploads the vertex buffer.
    ///
    /// Only for meshes initialized with `Dynamic` or `Stream` usage. The vertex
    /// count cannot change. Derived normals are recomputed.
    pub fn update_vertices(&mut self, gl: &dyn GraphicsDevice, positions: &[Vec3]) -> Result<(), RenderError> {
        let Some(buffers) = self.buffers else {
            error!("Mesh {} was updated before initialization", self.name);
            return Err(RenderError::NotInitialized(self.name.clone()));
        };
        if !self.usage.is_mutable() {
            error!("Mesh {} has static usage and cannot be updated", self.name);
            return Err(RenderError::ImmutableMesh(self.name.clone()));
        }
        if positions.len() != self.vertices.len() {
            return Err(RenderError::VertexCountMismatch {
                mesh: self.name.clone(),
                expected: self.vertices.len(),
                actual: positions.len(),
            });
        }

        for (vertex, position) in self.vertices.iter_mut().zip(positions) {
            vertex.position = *position;
        }
        if let Some(mode) = self.derived_normals {
            self.vertices = compute_normals(&self.vertices, &self.faces, mode);
        }

        let data = self.shape.interleave(&self.vertices);
        gl.bind_buffer(BufferTarget::Array, Some(buffers.vertex_buffer));
        self.write_vertex_bytes(gl, bytemuck::cast_slice(&data));
        gl.bind_buffer(BufferTarget::Array, None);
        Ok(())
    }

    /// Stores a per-mesh uniform value, copied into the shader before each draw.
    /// The name and type are checked against `contract`.
    pub fn set_param(
        &mut self,
        contract: &ShaderContract,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), ContractError> {
        let value = value.into();
        let Some(parameter) = contract.parameter(name) else {
            let err = ContractError::UnknownUniform {
                shader: contract.name().to_string(),
                name: name.to_string(),
            };
            warn!("Mesh {}: {}", self.name, err);
            return Err(err);
        };

        // Validate against a scratch copy of the slot
        parameter.clone().set(value)?;
        self.params.insert(name.to_string(), value);
        Ok(())
    }

    /// Draws the mesh with `contract`, which must already be bound.
    ///
    /// The model matrix and this mesh's parameters are copied into the
    /// contract first. If any declared uniform has still never been set, the
    /// draw is skipped.
    pub fn render(&mut self, gl: &dyn GraphicsDevice, contract: &mut ShaderContract) -> Result<(), RenderError> {
        let Some(buffers) = self.buffers else {
            error!("Mesh {} has not been initialized", self.name);
            return Err(RenderError::NotInitialized(self.name.clone()));
        };

        contract.supply_if_required(MODEL_UNIFORM, self.transform.matrix());
        for (name, value) in &self.params {
            contract.supply_if_required(name, *value);
        }

        if !contract.all_parameters_satisfied(gl) {
            let err = RenderError::UnsatisfiedParameters {
                mesh: self.name.clone(),
                shader: contract.name().to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        if let Some(binding) = self.texture {
            gl.bind_texture(binding.unit, Some(binding.texture));
        }
        gl.bind_vertex_array(Some(buffers.vertex_array));
        gl.draw_elements(buffers.index_count);
        gl.bind_vertex_array(None);
        Ok(())
    }

    /// Releases GPU buffers. Calling it again is a logged no-op.
    pub fn cleanup(&mut self, gl: &dyn GraphicsDevice) {
        let Some(buffers) = self.buffers.take() else {
            warn!("Mesh {} has no GPU resources to release", self.name);
            return;
        };
        gl.delete_vertex_array(buffers.vertex_array);
        gl.delete_buffer(buffers.vertex_buffer);
        gl.delete_buffer(buffers.index_buffer);
        debug!("Released mesh {}", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gpu::recording::{GlCall, RecordingDevice};
    use crate::engine::shaders::contract::tests::{basic_contract, FRAGMENT};
    use glam::{Mat4, Vec2, Vec4};

    fn triangle() -> Mesh {
        let vertices = vec![
            Vertex::new(Vec3::ZERO).with_normal(Vec3::Z),
            Vertex::new(Vec3::X).with_normal(Vec3::Z),
            Vertex::new(Vec3::Y).with_normal(Vec3::Z),
        ];
        Mesh::new("triangle", vertices, vec![[0, 1, 2]])
    }

    fn ready_contract(gl: &RecordingDevice) -> ShaderContract {
        let mut contract = basic_contract(gl);
        contract.set_parameter("view", Mat4::IDENTITY).unwrap();
        contract.set_parameter("projection", Mat4::IDENTITY).unwrap();
        contract
    }

    #[test]
    fn init_uploads_interleaved_vertices_and_indices() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();
        gl.clear_calls();

        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        let calls = gl.calls();

        let expected_vertices: Vec<f32> = vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        assert!(calls.contains(&GlCall::BufferDataSize(BufferTarget::Array, 72, BufferUsage::StaticDraw)));
        assert!(calls.contains(&GlCall::BufferSubData(
            BufferTarget::Array,
            0,
            bytemuck::cast_slice::<f32, u8>(&expected_vertices).to_vec()
        )));
        assert!(calls.contains(&GlCall::BufferData(
            BufferTarget::ElementArray,
            bytemuck::cast_slice::<u32, u8>(&[0u32, 1, 2]).to_vec(),
            BufferUsage::StaticDraw
        )));
        assert!(calls.contains(&GlCall::AttribPointer { index: 0, size: 3, stride: 24, offset: 0 }));
        assert!(calls.contains(&GlCall::AttribPointer { index: 1, size: 3, stride: 24, offset: 12 }));
        assert!(mesh.is_initialized());
        assert_eq!(mesh.init(&gl, &contract, MeshUsage::Static), Err(RenderError::AlreadyInitialized("triangle".into())));
    }

    #[test]
    fn texture_coordinates_shift_normal_offset() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let vertices = (0..3)
            .map(|i| {
                Vertex::new(Vec3::splat(i as f32))
                    .with_texture_coord(Vec2::ZERO)
                    .with_normal(Vec3::Y)
            })
            .collect();
        let mut mesh = Mesh::new("uv", vertices, vec![[0, 1, 2]]);

        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        assert!(gl
            .calls()
            .contains(&GlCall::AttribPointer { index: 1, size: 3, stride: 32, offset: 20 }));
    }

    #[test]
    fn render_without_required_uniform_skips_draw() {
        let gl = RecordingDevice::new();
        let mut contract = ready_contract(&gl);
        let mut mesh = triangle();
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();

        // "color" was never set
        let result = mesh.render(&gl, &mut contract);
        assert!(matches!(result, Err(RenderError::UnsatisfiedParameters { .. })));
        assert_eq!(gl.draw_count(), 0);

        mesh.set_param(&contract, "color", Vec4::ONE).unwrap();
        mesh.render(&gl, &mut contract).unwrap();
        assert_eq!(gl.draw_count(), 1);
        assert!(gl.calls().contains(&GlCall::DrawElements(3)));
    }

    #[test]
    fn texture_is_bound_before_draw_only_when_gate_passes() {
        let gl = RecordingDevice::new();
        let mut contract = ready_contract(&gl);
        let texture = TextureHandle(std::num::NonZeroU32::new(7).unwrap());
        let mut mesh = triangle();
        mesh.set_texture(2, texture);
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        gl.clear_calls();

        assert!(mesh.render(&gl, &mut contract).is_err());
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::BindTexture(..))));

        mesh.set_param(&contract, "color", Vec4::ONE).unwrap();
        mesh.render(&gl, &mut contract).unwrap();

        let calls = gl.calls();
        let bind = calls
            .iter()
            .position(|c| *c == GlCall::BindTexture(2, Some(texture)))
            .unwrap();
        let draw = calls.iter().position(|c| matches!(c, GlCall::DrawElements(_))).unwrap();
        assert!(bind < draw);
    }

    #[test]
    fn shader_cannot_change_after_init() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();
        mesh.set_shader(ShaderId(0)).unwrap();
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();

        assert_eq!(
            mesh.set_shader(ShaderId(1)),
            Err(RenderError::AlreadyInitialized("triangle".into()))
        );
        assert_eq!(mesh.shader(), Some(ShaderId(0)));
    }

    #[test]
    fn model_matrix_comes_from_transform() {
        let gl = RecordingDevice::new();
        let mut contract = ready_contract(&gl);
        let mut mesh = triangle();
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        mesh.set_param(&contract, "color", Vec4::ONE).unwrap();
        mesh.transform_mut().set_position(Vec3::new(2.0, 0.0, 0.0));

        mesh.render(&gl, &mut contract).unwrap();

        let model = contract.parameter("model").unwrap().value();
        assert_eq!(model, Some(UniformValue::Mat4(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)))));
    }

    #[test]
    fn render_before_init_is_rejected() {
        let gl = RecordingDevice::new();
        let mut contract = ready_contract(&gl);
        let mut mesh = triangle();

        assert_eq!(
            mesh.render(&gl, &mut contract),
            Err(RenderError::NotInitialized("triangle".into()))
        );
        assert_eq!(gl.draw_count(), 0);
    }

    #[test]
    fn set_param_checks_name_and_type() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();

        assert!(matches!(
            mesh.set_param(&contract, "tint", Vec4::ONE),
            Err(ContractError::UnknownUniform { .. })
        ));
        assert!(matches!(
            mesh.set_param(&contract, "color", 1.0f32),
            Err(ContractError::TypeMismatch { .. })
        ));
        assert_eq!(mesh.param("color"), None);

        mesh.set_param(&contract, "color", Vec4::ONE).unwrap();
        assert_eq!(mesh.param("color"), Some(UniformValue::Vec4(Vec4::ONE)));
    }

    #[test]
    fn static_mesh_rejects_updates() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();

        let result = mesh.update_vertices(&gl, &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(result, Err(RenderError::ImmutableMesh("triangle".into())));
    }

    #[test]
    fn stream_update_uses_mapped_write_and_rederives_normals() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let vertices = vec![Vertex::new(Vec3::ZERO), Vertex::new(Vec3::X), Vertex::new(Vec3::Y)];
        let mut mesh = Mesh::new("flat", vertices, vec![[0, 1, 2]]).with_derived_normals(NormalMode::Flat);
        mesh.init(&gl, &contract, MeshUsage::Stream).unwrap();
        gl.clear_calls();

        // Rotate the triangle into the XZ plane, flipping its normal to -Y
        mesh.update_vertices(&gl, &[Vec3::ZERO, Vec3::X, Vec3::Z]).unwrap();

        assert!(mesh.vertices().iter().all(|v| v.normal == Some(Vec3::NEG_Y)));
        assert!(gl
            .calls()
            .iter()
            .any(|c| matches!(c, GlCall::WriteMapped(BufferTarget::Array, data) if data.len() == 72)));
    }

    #[test]
    fn dynamic_update_rejects_count_change() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();
        mesh.init(&gl, &contract, MeshUsage::Dynamic).unwrap();

        let result = mesh.update_vertices(&gl, &[Vec3::ZERO]);
        assert!(matches!(result, Err(RenderError::VertexCountMismatch { expected: 3, actual: 1, .. })));

        mesh.update_vertices(&gl, &[Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
        assert!(gl.calls().iter().any(|c| matches!(c, GlCall::BufferSubData(BufferTarget::Array, 0, _))));
    }

    #[test]
    fn out_of_range_faces_are_dropped() {
        let mesh = Mesh::new("bad", vec![Vertex::new(Vec3::ZERO)], vec![[0, 0, 0], [0, 1, 2]]);
        assert_eq!(mesh.faces(), &[[0, 0, 0]]);
    }

    #[test]
    fn cleanup_twice_releases_once() {
        let gl = RecordingDevice::new();
        let contract = basic_contract(&gl);
        let mut mesh = triangle();
        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        gl.clear_calls();

        mesh.cleanup(&gl);
        mesh.cleanup(&gl);

        let calls = gl.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, GlCall::DeleteVertexArray(_))).count(), 1);
        assert_eq!(calls.iter().filter(|c| matches!(c, GlCall::DeleteBuffer(_))).count(), 2);
        assert!(!mesh.is_initialized());
    }

    #[test]
    fn fragment_only_contract_leaves_attributes_disabled() {
        let gl = RecordingDevice::new();
        let contract = ShaderContract::compile(&gl, "flat", "void main() {}", FRAGMENT).unwrap();
        let mut mesh = triangle();

        mesh.init(&gl, &contract, MeshUsage::Static).unwrap();
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::EnableAttrib(_))));
    }
}
