use std::collections::HashMap;

use anyhow::{anyhow, Result};
use generational_arena::Arena;

use crate::{
    atlas::{Atlas, RectHandle},
    render::TextureHandle,
};

/// Bytes per pixel, every texture is RGBA8.
pub const BYTES_PER_PIXEL: u32 = 4;

#[derive(Clone, Debug)]
pub struct Texture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: image::DynamicImage) -> Self {
        let rgba = img.into_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        }
    }

    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width * height * BYTES_PER_PIXEL) as usize],
            width,
            height,
        }
    }

    /// Builds the atlas image by copying every texture row by row into its packed rect.
    pub fn from_atlas(
        atlas: &Atlas,
        rect_to_tex: &HashMap<RectHandle, TextureHandle>,
        textures: &Arena<Texture>,
    ) -> Result<Self> {
        let mut atlas_texture = Self::blank(atlas.width, atlas.height);
        let stride = (atlas.width * BYTES_PER_PIXEL) as usize;

        for (rect_handle, texture_handle) in rect_to_tex {
            let rect = atlas
                .get_rect(*rect_handle)
                .ok_or(anyhow!("Atlas has no rect for texture {:?}.", texture_handle))?;
            let texture = textures
                .get(texture_handle.0)
                .ok_or(anyhow!("No texture for handle {:?}.", texture_handle))?;
            let row_len = (texture.width * BYTES_PER_PIXEL) as usize;

            for (row, src) in texture.data.chunks_exact(row_len.max(1)).enumerate() {
                let offset = (rect.y as usize + row) * stride
                    + (rect.x * BYTES_PER_PIXEL) as usize;
                atlas_texture.data[offset..offset + row_len].copy_from_slice(src);
            }
        }

        Ok(atlas_texture)
    }
}
