use generational_arena::Index;

use crate::error::Result;

#[derive(Eq, Hash, PartialEq, Clone, Copy, Debug)]
pub struct TextureHandle(pub Index);

/// Channel layout used for glyph textures. The fragment shader reads coverage
/// from `.r` for [TextureFormat::Alpha8] and from `.a` for [TextureFormat::Rgba8].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single channel 8 bit coverage.
    #[default]
    Alpha8,
    /// White RGB with coverage in alpha.
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }

    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Alpha8 => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// CPU side pixels ready for upload. Rows are tightly packed, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }

    /// Builds a glyph texture from an 8 bit coverage bitmap.
    ///
    /// Empty bitmaps become a single transparent pixel so every glyph owns a
    /// real texture.
    pub fn from_coverage(coverage: &[u8], width: u32, height: u32, format: TextureFormat) -> Self {
        let (coverage, width, height) = if width == 0 || height == 0 {
            (&[0u8][..], 1, 1)
        } else {
            (coverage, width, height)
        };

        let data = match format {
            TextureFormat::Alpha8 => coverage.to_vec(),
            TextureFormat::Rgba8 => coverage
                .iter()
                .flat_map(|&alpha| [255, 255, 255, alpha])
                .collect(),
        };

        Self {
            data,
            width,
            height,
            format,
        }
    }
}

/// Owner of the GPU textures backing cached glyphs.
///
/// Every handle returned by [GlyphTextures::upload] is released exactly once
/// through [GlyphTextures::release].
pub trait GlyphTextures {
    fn upload(&mut self, texture: &Texture) -> Result<TextureHandle>;

    fn release(&mut self, handle: TextureHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_coverage_is_copied_verbatim() {
        let texture = Texture::from_coverage(&[0, 128, 255, 7, 8, 9], 3, 2, TextureFormat::Alpha8);
        assert_eq!(texture.data, vec![0, 128, 255, 7, 8, 9]);
        assert_eq!(texture.bytes_per_row(), 3);
    }

    #[test]
    fn rgba_puts_coverage_in_alpha() {
        let texture = Texture::from_coverage(&[10, 200], 2, 1, TextureFormat::Rgba8);
        assert_eq!(texture.data, vec![255, 255, 255, 10, 255, 255, 255, 200]);
        assert_eq!(texture.bytes_per_row(), 8);
    }

    #[test]
    fn empty_bitmap_becomes_one_transparent_pixel() {
        let texture = Texture::from_coverage(&[], 0, 0, TextureFormat::Rgba8);
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.data, vec![255, 255, 255, 0]);
    }
}
