use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::{debug, error, info, warn};

use crate::engine::components::{Mesh, MeshUsage};
use crate::engine::config::AssetConfig;
use crate::engine::errors::{AssetError, RenderError, ShaderError};
use crate::engine::gpu::GraphicsDevice;
use crate::engine::loaders::{ImportedGeometry, ObjLoader};
use crate::engine::shaders::ShaderContract;
use crate::engine::utils::{asset_name, files_with_suffix, read_file, NormalMode};

const VERTEX_SUFFIX: &str = ".vert.glsl";
const FRAGMENT_SUFFIX: &str = ".frag.glsl";
const MODEL_SUFFIX: &str = ".obj";

/// Index of a shader in the [`AssetsManager`] registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) usize);

impl ShaderId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ShaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct ShaderEntry {
    contract: ShaderContract,
    /// Layers currently holding this shader
    users: usize,
}

/// Registry of compiled shaders and imported model geometry.
///
/// Shaders are append-only and addressed by [`ShaderId`]; meshes refer to
/// them by id and never own them. Models are kept as CPU-side templates that
/// [`AssetsManager::create_mesh`] turns into GPU meshes.
#[derive(Debug, Default)]
pub struct AssetsManager {
    shaders: Vec<ShaderEntry>,
    shader_ids: HashMap<String, ShaderId>,
    models: HashMap<String, ImportedGeometry>,
    loader: ObjLoader,
    initialized: bool,
}

impl AssetsManager {
    pub fn new(normal_mode: NormalMode) -> Self {
        Self {
            loader: ObjLoader::new(normal_mode),
            ..Self::default()
        }
    }

    /// Loads every shader pair and model from the configured directories.
    ///
    /// Missing directories and files are logged and skipped. A shader that
    /// fails to compile or link aborts initialization.
    pub fn initialize(&mut self, gl: &dyn GraphicsDevice, config: &AssetConfig) -> Result<(), ShaderError> {
        if self.initialized {
            warn!("AssetsManager already initialized");
            return Ok(());
        }
        info!("Initializing AssetsManager and loading all assets...");

        self.loader = ObjLoader::new(config.normal_mode);
        let shaders = self.load_shader_dir(gl, &config.shader_dir)?;
        let models = self.load_model_dir(&config.model_dir);

        self.initialized = true;
        info!(
            "AssetsManager initialization complete. Loaded {} shaders and {} models.",
            shaders, models
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Compiles every `<name>.vert.glsl` that has a matching `<name>.frag.glsl`
    pub fn load_shader_dir(&mut self, gl: &dyn GraphicsDevice, dir: &Path) -> Result<usize, ShaderError> {
        let (vertex_files, fragment_files) = match (
            files_with_suffix(dir, VERTEX_SUFFIX),
            files_with_suffix(dir, FRAGMENT_SUFFIX),
        ) {
            (Ok(vertex), Ok(fragment)) => (vertex, fragment),
            (Err(err), _) | (_, Err(err)) => {
                warn!("Skipping shader directory: {}", err);
                return Ok(0);
            }
        };

        let fragment_names: Vec<String> = fragment_files.iter().filter_map(|p| asset_name(p)).collect();
        let vertex_names: Vec<String> = vertex_files.iter().filter_map(|p| asset_name(p)).collect();
        for orphan in fragment_names.iter().filter(|name| !vertex_names.contains(name)) {
            warn!("Fragment shader {} has no matching vertex shader; skipped", orphan);
        }

        let mut loaded = 0;
        for name in &vertex_names {
            if !fragment_names.contains(name) {
                warn!("Vertex shader {} has no matching fragment shader; skipped", name);
                continue;
            }
            if self.load_shader(gl, dir, name)?.is_some() {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Compiles `<dir>/<name>.vert.glsl` + `<dir>/<name>.frag.glsl`.
    /// Returns `None` (logged) when either file cannot be read.
    pub fn load_shader(
        &mut self,
        gl: &dyn GraphicsDevice,
        dir: &Path,
        name: &str,
    ) -> Result<Option<ShaderId>, ShaderError> {
        let sources = read_file(dir.join(format!("{name}{VERTEX_SUFFIX}")))
            .and_then(|vs| Ok((vs, read_file(dir.join(format!("{name}{FRAGMENT_SUFFIX}")))?)));
        match sources {
            Ok((vertex, fragment)) => self.add_shader(gl, name, &vertex, &fragment).map(Some),
            Err(err) => {
                error!("Shader {} not loaded: {}", name, err);
                Ok(None)
            }
        }
    }

    /// Registers a shader from source. A name that is already registered keeps
    /// its existing program.
    pub fn add_shader(
        &mut self,
        gl: &dyn GraphicsDevice,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderId, ShaderError> {
        if let Some(&id) = self.shader_ids.get(name) {
            warn!("Shader {} is already registered", name);
            return Ok(id);
        }

        let contract = ShaderContract::compile(gl, name, vertex_source, fragment_source)?;
        let id = ShaderId(self.shaders.len());
        self.shaders.push(ShaderEntry { contract, users: 0 });
        self.shader_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Parses every `.obj` file in `dir` into a model template
    pub fn load_model_dir(&mut self, dir: &Path) -> usize {
        let files = match files_with_suffix(dir, MODEL_SUFFIX) {
            Ok(files) => files,
            Err(err) => {
                warn!("Skipping model directory: {}", err);
                return 0;
            }
        };

        let mut loaded = 0;
        for path in files {
            let Some(name) = asset_name(&path) else {
                continue;
            };
            match self.loader.load(&path) {
                Ok(geometry) => {
                    self.add_model(&name, geometry);
                    loaded += 1;
                }
                Err(err) => error!("Model {} not loaded: {}", name, err),
            }
        }
        loaded
    }

    pub fn add_model(&mut self, name: &str, geometry: ImportedGeometry) {
        if self.models.insert(name.to_string(), geometry).is_some() {
            debug!("Replaced model template {}", name);
        }
    }

    pub fn load_model(&mut self, path: &Path) -> Result<(), AssetError> {
        let name = asset_name(path).ok_or_else(|| AssetError::NotFound(path.display().to_string()))?;
        let geometry = self.loader.load(path)?;
        self.add_model(&name, geometry);
        Ok(())
    }

    pub fn model(&self, name: &str) -> Option<&ImportedGeometry> {
        self.models.get(name)
    }

    pub fn shader_id(&self, name: &str) -> Option<ShaderId> {
        self.shader_ids.get(name).copied()
    }

    pub fn shader(&self, id: ShaderId) -> Option<&ShaderContract> {
        self.shaders.get(id.0).map(|entry| &entry.contract)
    }

    pub fn shader_mut(&mut self, id: ShaderId) -> Option<&mut ShaderContract> {
        self.shaders.get_mut(id.0).map(|entry| &mut entry.contract)
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// Builds a GPU mesh from the model template `name`, bound to `shader`.
    /// Unknown models or shaders are logged and yield `None`.
    pub fn create_mesh(
        &self,
        gl: &dyn GraphicsDevice,
        name: &str,
        shader: ShaderId,
        usage: MeshUsage,
    ) -> Option<Mesh> {
        let Some(geometry) = self.models.get(name) else {
            error!("Mesh {} not found", name);
            return None;
        };
        let Some(contract) = self.shader(shader) else {
            error!("Cannot create mesh {}: shader {} is not registered", name, shader);
            return None;
        };

        let mut mesh = Mesh::from_geometry(name, geometry).with_shader(shader);
        match mesh.init(gl, contract, usage) {
            Ok(()) => Some(mesh),
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }

    /// Records one more layer using `id`
    pub fn retain_shader(&mut self, id: ShaderId) -> Result<(), RenderError> {
        let entry = self.shaders.get_mut(id.0).ok_or(RenderError::UnknownShader(id.0))?;
        entry.users += 1;
        Ok(())
    }

    /// Drops one layer's hold on `id`; the program is deleted with the last one
    pub fn release_shader(&mut self, gl: &dyn GraphicsDevice, id: ShaderId) {
        let Some(entry) = self.shaders.get_mut(id.0) else {
            warn!("Release of unknown shader {}", id);
            return;
        };
        if entry.users == 0 {
            warn!("Shader {} released more often than retained", entry.contract.name());
            return;
        }
        entry.users -= 1;
        if entry.users == 0 {
            entry.contract.delete(gl);
        }
    }

    /// Deletes every remaining program and forgets all assets
    pub fn teardown(&mut self, gl: &dyn GraphicsDevice) {
        for entry in &mut self.shaders {
            entry.contract.delete(gl);
        }
        self.shaders.clear();
        self.shader_ids.clear();
        self.models.clear();
        self.initialized = false;
        debug!("AssetsManager torn down");
    }
}
