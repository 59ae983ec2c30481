use std::path::Path;

use log::{debug, info};

use crate::engine::errors::AssetError;
use crate::engine::gpu::{GraphicsDevice, TextureHandle};
use crate::engine::utils::read_bytes;

/// Decodes an encoded image (PNG) into tightly packed RGBA8 pixels
pub fn decode_rgba8(encoded: &[u8]) -> Result<(u32, u32, Vec<u8>), AssetError> {
    let img = image::load_from_memory(encoded)?;
    debug!("Decoding image with color type {:?}", img.color());

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

/// A 2D RGBA texture living on the GPU
#[derive(Debug)]
pub struct Texture {
    handle: Option<TextureHandle>,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn from_encoded(gl: &dyn GraphicsDevice, encoded: &[u8]) -> Result<Self, AssetError> {
        let (width, height, pixels) = decode_rgba8(encoded)?;
        let handle = gl.create_texture().map_err(AssetError::Gpu)?;
        gl.upload_texture_rgba8(handle, width, height, &pixels);

        Ok(Self {
            handle: Some(handle),
            width,
            height,
        })
    }

    pub fn load(gl: &dyn GraphicsDevice, path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let texture = Self::from_encoded(gl, &read_bytes(path)?)?;
        info!("Texture loaded: {} ({}x{})", path.display(), texture.width, texture.height);
        Ok(texture)
    }

    /// `None` after `delete`
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bind(&self, gl: &dyn GraphicsDevice, unit: u32) {
        gl.bind_texture(unit, self.handle);
    }

    pub fn delete(&mut self, gl: &dyn GraphicsDevice) {
        if let Some(handle) = self.handle.take() {
            gl.delete_texture(handle);
        }
    }
}
