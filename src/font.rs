use std::path::Path;

use anyhow::{Context, Result};
use bitglyph_asset::Loader;
use log::{error, info};

use crate::{
    glyph::{GlyphEntry, GlyphIndex, GlyphIndexResolver, GlyphSet, IntVec2},
    layout::StringLayout,
    render::{Render, TextureHandle},
    texture::Texture,
};

/// Folder the demo looks for glyph images in, relative to the working directory.
pub const LETTER_FOLDER: &str = "LetterImages";

/// Glyph image files in glyph index order. Characters like '?' aren't valid
/// file names everywhere, so the unknown glyph is spelled out.
pub const GLYPH_FILE_NAMES: [&str; 23] = [
    "0.png", "1.png", "2.png", "3.png", "4.png", "5.png", "6.png", "7.png", "8.png", "9.png",
    "A.png", "B.png", "C.png", "D.png", "E.png", "F.png", "G.png", "H.png", "I.png", "J.png",
    "K.png", "L.png", "QMark.png",
];

/// Decoded glyph images, not yet on the gpu.
pub struct GlyphImages {
    glyphs: GlyphSet,
    textures: Vec<Option<Texture>>,
}

impl GlyphImages {
    pub fn load<P: AsRef<Path>>(folder: P) -> Result<Self> {
        Self::load_named(folder, &GLYPH_FILE_NAMES)
    }

    /// Loads `names` from `folder` in order, the last name being the unknown glyph.
    ///
    /// An image that can't be read or decoded is logged and becomes a 0x0 glyph
    /// without a texture; loading carries on with the rest.
    pub fn load_named<P: AsRef<Path>>(folder: P, names: &[&str]) -> Result<Self> {
        let mut loader = Loader::new(folder);
        info!("Looking for images in folder {:?}", loader.root());

        let mut entries = Vec::with_capacity(names.len());
        let mut textures = Vec::with_capacity(names.len());
        for name in names {
            let texture = loader.load(name).and_then(|asset| {
                Texture::from_bytes(&asset.bytes)
                    .with_context(|| format!("Couldn't decode {}", asset.name))
            });
            // decoded, the raw bytes aren't needed anymore
            loader.evict(name);

            match texture {
                Ok(texture) => {
                    let size = IntVec2::new(texture.width() as i32, texture.height() as i32);
                    entries.push(GlyphEntry::new(name, size));
                    textures.push(Some(texture));
                }
                Err(err) => {
                    error!(
                        "Image '{}' could not be loaded: {:#}",
                        loader.path_of(name).display(),
                        err
                    );
                    entries.push(GlyphEntry::new(name, IntVec2::ZERO));
                    textures.push(None);
                }
            }
        }

        let glyphs = GlyphSet::new(entries)?;
        info!(
            "Done loading images, {} of {} found.",
            textures.iter().flatten().count(),
            glyphs.len()
        );
        Ok(Self { glyphs, textures })
    }

    pub fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    pub fn texture(&self, index: GlyphIndex) -> Option<&Texture> {
        self.textures.get(index.0).and_then(Option::as_ref)
    }
}

/// A glyph table whose images live in the renderer's atlas.
pub struct BitmapFont {
    glyphs: GlyphSet,
    resolver: GlyphIndexResolver,
    textures: Vec<Option<TextureHandle>>,
}

impl BitmapFont {
    pub fn upload(render: &mut Render, images: GlyphImages) -> Result<Self> {
        Self::upload_with(render, images, |glyphs| {
            GlyphIndexResolver::for_glyph_set(glyphs)
        })
    }

    pub fn upload_with<F>(render: &mut Render, images: GlyphImages, resolver: F) -> Result<Self>
    where
        F: FnOnce(&GlyphSet) -> GlyphIndexResolver,
    {
        let GlyphImages { glyphs, textures } = images;
        let resolver = resolver(&glyphs);
        resolver.check(&glyphs)?;

        let textures = textures
            .into_iter()
            .map(|texture| texture.map(|texture| render.add_texture(texture)))
            .collect();

        Ok(Self {
            glyphs,
            resolver,
            textures,
        })
    }

    pub fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    pub fn texture(&self, index: GlyphIndex) -> Option<TextureHandle> {
        self.textures.get(index.0).copied().flatten()
    }

    pub fn layout(&self) -> StringLayout<'_> {
        StringLayout::new(&self.resolver, &self.glyphs)
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use image::RgbaImage;
    use test_log::test;

    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bitglyph_font_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbaImage::new(width, height).save(dir.join(name)).unwrap();
    }

    #[test]
    fn loads_sizes_and_degrades_missing_images() {
        let dir = scratch_dir("partial");
        write_png(&dir, "0.png", 10, 16);
        write_png(&dir, "A.png", 12, 16);
        write_png(&dir, "QMark.png", 9, 15);
        // present but not an image
        fs::write(dir.join("B.png"), b"not a png").unwrap();

        let images = GlyphImages::load(&dir).unwrap();
        let glyphs = images.glyphs();

        assert_eq!(glyphs.len(), 23);
        assert_eq!(glyphs.unknown_index(), GlyphIndex(22));
        assert_eq!(glyphs.size(GlyphIndex(0)), IntVec2::new(10, 16));
        assert_eq!(glyphs.size(GlyphIndex(10)), IntVec2::new(12, 16));
        assert_eq!(glyphs.size(GlyphIndex(22)), IntVec2::new(9, 15));
        assert_eq!(glyphs.size(GlyphIndex(1)), IntVec2::ZERO);
        assert_eq!(glyphs.size(GlyphIndex(11)), IntVec2::ZERO);
        assert_eq!(glyphs.get(GlyphIndex(11)).unwrap().name, "B.png");

        assert!(images.texture(GlyphIndex(0)).is_some());
        assert!(images.texture(GlyphIndex(1)).is_none());
        assert!(images.texture(GlyphIndex(11)).is_none());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_folder_still_yields_a_full_table() {
        let dir = std::env::temp_dir().join("bitglyph_font_does_not_exist");
        let images = GlyphImages::load(&dir).unwrap();

        assert_eq!(images.glyphs().len(), GLYPH_FILE_NAMES.len());
        assert!(images.glyphs().iter().all(|(_, entry)| entry.size == IntVec2::ZERO));
    }

    #[test]
    fn loaded_widths_drive_the_layout() {
        let dir = scratch_dir("layout");
        write_png(&dir, "9.png", 7, 16);
        write_png(&dir, "QMark.png", 11, 16);

        let images = GlyphImages::load(&dir).unwrap();
        let resolver = GlyphIndexResolver::for_glyph_set(images.glyphs());
        let placements =
            StringLayout::new(&resolver, images.glyphs()).layout(IntVec2::new(32, 64), "9:9");

        let xs: Vec<i32> = placements.iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![32, 32 + 7 + 2, 32 + 7 + 2 + 11 + 2]);

        fs::remove_dir_all(dir).unwrap();
    }
}
