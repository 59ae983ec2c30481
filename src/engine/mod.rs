pub mod components;
pub mod config;
pub mod errors;
pub mod gpu;
pub mod loaders;
pub mod logging;
pub mod managers;
pub mod rendering;
pub mod shaders;
pub mod utils;

// Re-export commonly used items
pub use components::*;
pub use config::EngineConfig;
pub use errors::*;
pub use gpu::GraphicsDevice;
pub use loaders::*;
pub use logging::init_logging;
pub use managers::*;
pub use rendering::*;
pub use shaders::*;
pub use utils::*;
