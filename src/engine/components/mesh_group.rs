use log::{debug, warn};

use super::{Mesh, MeshUsage};
use crate::engine::errors::{ContractError, RenderError};
use crate::engine::gpu::GraphicsDevice;
use crate::engine::managers::ShaderId;
use crate::engine::shaders::{ShaderContract, UniformValue};

/// Meshes that are initialized, drawn and released together
#[derive(Debug, Default)]
pub struct MeshGroup {
    name: String,
    meshes: Vec<Mesh>,
}

impl MeshGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    pub fn into_meshes(self) -> Vec<Mesh> {
        self.meshes
    }

    /// Assigns `shader` to every member
    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.meshes = self.meshes.into_iter().map(|mesh| mesh.with_shader(shader)).collect();
        self
    }

    pub fn init(
        &mut self,
        gl: &dyn GraphicsDevice,
        contract: &ShaderContract,
        usage: MeshUsage,
    ) -> Result<(), RenderError> {
        for mesh in &mut self.meshes {
            mesh.init(gl, contract, usage)?;
        }
        debug!("Initialized mesh group {} ({} meshes)", self.name, self.meshes.len());
        Ok(())
    }

    /// Sets the same per-mesh uniform on every member
    pub fn set_param(
        &mut self,
        contract: &ShaderContract,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), ContractError> {
        let value = value.into();
        for mesh in &mut self.meshes {
            mesh.set_param(contract, name, value)?;
        }
        Ok(())
    }

    /// Draws every member. All members are attempted; the first failure is returned.
    pub fn render(&mut self, gl: &dyn GraphicsDevice, contract: &mut ShaderContract) -> Result<(), RenderError> {
        let mut first_error = None;
        for mesh in &mut self.meshes {
            if let Err(err) = mesh.render(gl, contract) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn cleanup(&mut self, gl: &dyn GraphicsDevice) {
        if self.meshes.is_empty() {
            warn!("Mesh group {} is empty", self.name);
        }
        for mesh in &mut self.meshes {
            mesh.cleanup(gl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::shapes;
    use crate::engine::gpu::recording::{GlCall, RecordingDevice};
    use crate::engine::shaders::contract::tests::basic_contract;
    use glam::{Mat4, Vec3, Vec4};

    fn pair() -> MeshGroup {
        let mut group = MeshGroup::new("pair");
        group.add(shapes::line("a", Vec3::ZERO, Vec3::X, 0.1));
        group.add(shapes::line("b", Vec3::ZERO, Vec3::Y, 0.1));
        group
    }

    #[test]
    fn group_draws_and_releases_every_member() {
        let gl = RecordingDevice::new();
        let mut contract = basic_contract(&gl);
        contract.set_parameter("view", Mat4::IDENTITY).unwrap();
        contract.set_parameter("projection", Mat4::IDENTITY).unwrap();
        let mut group = pair();
        group.init(&gl, &contract, MeshUsage::Static).unwrap();

        assert!(group.render(&gl, &mut contract).is_err());
        assert_eq!(gl.draw_count(), 0);

        group.set_param(&contract, "color", Vec4::ONE).unwrap();
        group.render(&gl, &mut contract).unwrap();
        assert_eq!(gl.draw_count(), 2);

        gl.clear_calls();
        group.cleanup(&gl);
        let deleted = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GlCall::DeleteVertexArray(_)))
            .count();
        assert_eq!(deleted, 2);
        assert!(group.meshes().iter().all(|m| !m.is_initialized()));
    }

    #[test]
    fn shader_applies_to_all_members() {
        let group = pair().with_shader(ShaderId(4));
        assert!(group.meshes().iter().all(|m| m.shader() == Some(ShaderId(4))));
    }
}
