use std::path::{Path, PathBuf};

use crate::{
    text::{font::default_fallback_font, glyph_cache::DEFAULT_CACHE_CAPACITY},
    texture::TextureFormat,
};

pub const DEFAULT_MAX_GLYPHS_PER_CALL: usize = 100;
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Settings for a [crate::render::TextRenderer].
///
/// ```
/// use glyphquad::config::TextConfig;
///
/// let config = TextConfig::default()
///     .with_cache_capacity(256)
///     .with_fallback_font("fonts/NotoSansSC-Regular.otf")
///     .with_shadow(true);
/// assert_eq!(config.cache_capacity, 256);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TextConfig {
    /// Glyph textures kept alive before the least recently used is evicted.
    pub cache_capacity: usize,
    /// Glyphs the vertex buffer holds up front. Longer strings grow it.
    pub max_glyphs_per_call: usize,
    pub font_size: u32,
    pub fallback_font: PathBuf,
    pub texture_format: TextureFormat,
    pub shadow: bool,
    /// In texture coordinates.
    pub shadow_offset: [f32; 2],
}

impl TextConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub fn with_max_glyphs_per_call(mut self, max_glyphs: usize) -> Self {
        self.max_glyphs_per_call = max_glyphs.max(1);
        self
    }

    pub fn with_font_size(mut self, px: u32) -> Self {
        self.font_size = px;
        self
    }

    pub fn with_fallback_font<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.fallback_font = path.as_ref().to_path_buf();
        self
    }

    pub fn with_texture_format(mut self, format: TextureFormat) -> Self {
        self.texture_format = format;
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_shadow_offset(mut self, offset: [f32; 2]) -> Self {
        self.shadow_offset = offset;
        self
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_glyphs_per_call: DEFAULT_MAX_GLYPHS_PER_CALL,
            font_size: DEFAULT_FONT_SIZE,
            fallback_font: default_fallback_font(),
            texture_format: TextureFormat::Alpha8,
            shadow: false,
            shadow_offset: [0.05, 0.05],
        }
    }
}
