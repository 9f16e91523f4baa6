pub mod bind;
pub mod camera;
pub mod config;
pub mod error;
pub mod lru;
pub mod pipeline;
pub mod plain;
pub mod render;
pub mod text;
pub mod texture;

#[cfg(test)]
mod testing;

pub use config::TextConfig;
pub use error::{Result, TextError};
pub use render::{GpuTextures, TextRenderer};
pub use text::{
    anchor::TextAnchor,
    font::FontContext,
    glyph_cache::{CacheStats, GlyphCache, GlyphEntry},
    layout::BoundingBox,
};
pub use texture::TextureFormat;
