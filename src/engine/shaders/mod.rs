pub mod contract;
pub mod parameter;
pub mod scanner;

pub use contract::ShaderContract;
pub use parameter::{ShaderParameter, UniformType, UniformValue};
pub use scanner::{scan_requirements, ShaderRequirements, VertexAttribute};
