use std::collections::{BTreeMap, HashMap};

use log::{debug, error, trace};

use crate::engine::components::{Camera, Mesh, MeshGroup};
use crate::engine::errors::RenderError;
use crate::engine::gpu::{Capability, GraphicsDevice};
use crate::engine::managers::{AssetsManager, ShaderId};

pub const PROJECTION_UNIFORM: &str = "projection";
pub const VIEW_UNIFORM: &str = "view";
pub const ASPECT_RATIO_UNIFORM: &str = "aspectRatio";
pub const CAMERA_POSITION_UNIFORM: &str = "cameraPos";

/// Stable reference to a mesh registered in a [`RenderLayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    shader: ShaderId,
    index: usize,
}

/// Outcome of one `render` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub skipped: usize,
}

impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, other: Self) {
        self.drawn += other.drawn;
        self.skipped += other.skipped;
    }
}

/// Meshes grouped by shader. Each shader is bound once per frame and fed the
/// camera uniforms it declares before its meshes are drawn.
#[derive(Debug)]
pub struct RenderLayer {
    name: String,
    shaders: HashMap<String, ShaderId>,
    batches: BTreeMap<ShaderId, Vec<Mesh>>,
    clear_depth: bool,
}

impl RenderLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: HashMap::new(),
            batches: BTreeMap::new(),
            clear_depth: true,
        }
    }

    /// Whether the depth buffer is cleared before this layer draws
    pub fn with_depth_clear(mut self, clear_depth: bool) -> Self {
        self.clear_depth = clear_depth;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `mesh` to its shader's batch. The first mesh for a shader creates
    /// the batch and retains the shader in `assets`.
    pub fn register(&mut self, assets: &mut AssetsManager, mesh: Mesh) -> Result<MeshHandle, RenderError> {
        let Some(shader) = mesh.shader() else {
            error!("Mesh {} has no shader; not added to layer {}", mesh.name(), self.name);
            return Err(RenderError::MeshWithoutShader(mesh.name().to_string()));
        };
        let Some(contract) = assets.shader(shader) else {
            error!("Mesh {} uses unknown shader {}", mesh.name(), shader);
            return Err(RenderError::UnknownShader(shader.index()));
        };

        if !self.shaders.contains_key(contract.name()) {
            self.shaders.insert(contract.name().to_string(), shader);
            assets.retain_shader(shader)?;
            debug!("Layer {} now batches shader {}", self.name, shader);
        }

        let batch = self.batches.entry(shader).or_default();
        batch.push(mesh);
        Ok(MeshHandle {
            shader,
            index: batch.len() - 1,
        })
    }

    /// Registers every member of `group`. Nothing is added unless every
    /// member has a registered shader.
    pub fn register_group(
        &mut self,
        assets: &mut AssetsManager,
        group: MeshGroup,
    ) -> Result<Vec<MeshHandle>, RenderError> {
        for mesh in group.meshes() {
            match mesh.shader() {
                None => {
                    error!("Group {} member {} has no shader", group.name(), mesh.name());
                    return Err(RenderError::MeshWithoutShader(mesh.name().to_string()));
                }
                Some(shader) if assets.shader(shader).is_none() => {
                    error!("Group {} member {} uses unknown shader {}", group.name(), mesh.name(), shader);
                    return Err(RenderError::UnknownShader(shader.index()));
                }
                Some(_) => {}
            }
        }

        group
            .into_meshes()
            .into_iter()
            .map(|mesh| self.register(assets, mesh))
            .collect()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.batches.get(&handle.shader)?.get(handle.index)
    }

    pub fn mesh_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.batches.get_mut(&handle.shader)?.get_mut(handle.index)
    }

    pub fn mesh_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    /// Shader ids in draw order
    pub fn shaders(&self) -> impl Iterator<Item = ShaderId> + '_ {
        self.batches.keys().copied()
    }

    pub fn render(
        &mut self,
        gl: &dyn GraphicsDevice,
        assets: &mut AssetsManager,
        camera: &Camera,
        aspect_ratio: f32,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        if self.clear_depth {
            gl.clear(None, true);
        }
        gl.set_capability(Capability::DepthTest, true);
        gl.set_capability(Capability::Blend, true);
        gl.blend_alpha();

        let projection = camera.projection_matrix(aspect_ratio);
        let view = camera.view_matrix();

        for (&shader, meshes) in self.batches.iter_mut() {
            if meshes.is_empty() {
                continue;
            }
            let Some(contract) = assets.shader_mut(shader) else {
                error!("Layer {} references unknown shader {}", self.name, shader);
                stats.skipped += meshes.len();
                continue;
            };

            contract.bind(gl);
            contract.supply_if_required(PROJECTION_UNIFORM, projection);
            contract.supply_if_required(VIEW_UNIFORM, view);
            contract.supply_if_required(ASPECT_RATIO_UNIFORM, aspect_ratio);
            contract.supply_if_required(CAMERA_POSITION_UNIFORM, camera.position());

            for mesh in meshes.iter_mut() {
                match mesh.render(gl, contract) {
                    Ok(()) => stats.drawn += 1,
                    Err(_) => stats.skipped += 1,
                }
            }
            contract.unbind(gl);
        }

        trace!("Layer {}: {} drawn, {} skipped", self.name, stats.drawn, stats.skipped);
        stats
    }

    /// Releases every mesh, then this layer's hold on each shader
    pub fn cleanup(&mut self, gl: &dyn GraphicsDevice, assets: &mut AssetsManager) {
        for meshes in self.batches.values_mut() {
            for mesh in meshes.iter_mut() {
                mesh.cleanup(gl);
            }
        }
        for shader in std::mem::take(&mut self.shaders).into_values() {
            assets.release_shader(gl, shader);
        }
        self.batches.clear();
        debug!("Layer {} cleaned up", self.name);
    }
}
