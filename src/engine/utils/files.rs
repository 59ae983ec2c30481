use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::errors::AssetError;

pub fn read_file(path: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Files directly inside `dir` whose name ends with `suffix`, sorted by name
pub fn files_with_suffix(dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>, AssetError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// File name up to the first dot: `basic.vert.glsl` -> `basic`
pub fn asset_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next()?;
    (!stem.is_empty()).then(|| stem.to_string())
}
