pub mod render_layer;
pub mod renderer;

pub use render_layer::{FrameStats, MeshHandle, RenderLayer};
pub use renderer::{LayerId, Renderer};
