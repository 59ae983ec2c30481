pub mod files;
pub mod normals;

pub use files::{asset_name, files_with_suffix, read_bytes, read_file};
pub use normals::{compute_normals, face_normal, NormalMode};
