//! Engine settings loaded from a JSON file.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::engine::errors::ConfigError;
use crate::engine::utils::NormalMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub clear_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "runst-render".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: [0.08, 0.08, 0.1, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub shader_dir: PathBuf,
    pub model_dir: PathBuf,
    /// How normals are derived for models that carry none
    pub normal_mode: NormalMode,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("assets/shaders"),
            model_dir: PathBuf::from("assets/models"),
            normal_mode: NormalMode::Smooth,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    /// `env_logger` filter; `RUST_LOG` is used when absent
    pub log_filter: Option<String>,
}

impl EngineConfig {
    /// Reads the config at `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "window": { "width": 640 } }"#).unwrap();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.assets, AssetConfig::default());
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn normal_mode_is_lowercase() {
        let config =
            EngineConfig::from_json(r#"{ "assets": { "normal_mode": "flat" } }"#).unwrap();
        assert_eq!(config.assets.normal_mode, NormalMode::Flat);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = EngineConfig::load("does/not/exist.json").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join("runst_render_bad_config.json");
        fs::write(&path, "{ not json").unwrap();

        let result = EngineConfig::load(&path);
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
