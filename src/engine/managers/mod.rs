pub mod assets_manager;

pub use assets_manager::{AssetsManager, ShaderId};
