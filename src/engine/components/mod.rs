pub mod camera;
pub mod mesh;
pub mod mesh_group;
pub mod shapes;
pub mod texture;
pub mod transform;
pub mod vertex;

pub use camera::{Camera, Projection};
pub use mesh::{Mesh, MeshUsage, TextureBinding, MODEL_UNIFORM};
pub use mesh_group::MeshGroup;
pub use texture::{decode_rgba8, Texture};
pub use transform::Transform;
pub use vertex::{Face, Vertex, VertexIndex, VertexShape};
