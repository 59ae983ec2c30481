use log::{debug, info};

use super::{FrameStats, RenderLayer};
use crate::engine::components::Camera;
use crate::engine::gpu::GraphicsDevice;
use crate::engine::managers::AssetsManager;

/// Index of a layer owned by a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

/// Owns the asset registry and the render layers drawn each frame
#[derive(Debug)]
pub struct Renderer {
    assets: AssetsManager,
    layers: Vec<RenderLayer>,
    clear_color: [f32; 4],
    viewport: (u32, u32),
}

impl Renderer {
    pub fn new(assets: AssetsManager, clear_color: [f32; 4]) -> Self {
        Self {
            assets,
            layers: Vec::new(),
            clear_color,
            viewport: (1, 1),
        }
    }

    pub fn assets(&self) -> &AssetsManager {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetsManager {
        &mut self.assets
    }

    /// Layers draw in the order they were added
    pub fn add_layer(&mut self, layer: RenderLayer) -> LayerId {
        debug!("Added render layer {}", layer.name());
        self.layers.push(layer);
        LayerId(self.layers.len() - 1)
    }

    pub fn layer(&self, id: LayerId) -> Option<&RenderLayer> {
        self.layers.get(id.0)
    }

    /// The layer together with the registry it registers meshes against
    pub fn layer_and_assets_mut(&mut self, id: LayerId) -> Option<(&mut RenderLayer, &mut AssetsManager)> {
        let layer = self.layers.get_mut(id.0)?;
        Some((layer, &mut self.assets))
    }

    pub fn resize(&mut self, gl: &dyn GraphicsDevice, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
        gl.viewport(self.viewport.0 as i32, self.viewport.1 as i32);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    pub fn render_frame(&mut self, gl: &dyn GraphicsDevice, camera: &Camera) -> FrameStats {
        gl.clear(Some(self.clear_color), true);

        let aspect_ratio = self.aspect_ratio();
        let mut stats = FrameStats::default();
        for layer in &mut self.layers {
            stats += layer.render(gl, &mut self.assets, camera, aspect_ratio);
        }
        stats
    }

    /// Cleans up every layer, then tears down the registry
    pub fn cleanup(&mut self, gl: &dyn GraphicsDevice) {
        for layer in &mut self.layers {
            layer.cleanup(gl, &mut self.assets);
        }
        self.layers.clear();
        self.assets.teardown(gl);
        info!("Renderer cleaned up");
    }
}
