//! Lazily rasterized, LRU-bounded glyph textures.
//!
//! Each cached character owns exactly one GPU texture. The texture is released
//! the moment the entry leaves the cache, whether through eviction,
//! [GlyphCache::invalidate], a font change or dropping the cache.

use crate::{
    error::Result,
    lru::LruMap,
    text::{
        font::{FontRole, RasterizedGlyph, Rasterizer},
        layout::GlyphSource,
    },
    texture::{GlyphTextures, Texture, TextureFormat, TextureHandle},
};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// One rasterized character as stored in the cache.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphEntry {
    pub character: char,
    pub texture: TextureHandle,
    /// Bitmap size in pixels; `(0, 0)` for whitespace and missing glyphs.
    pub size: (u32, u32),
    /// (left, top) from the pen origin to the bitmap's top-left corner, Y up.
    pub bearing: (i32, i32),
    /// Unscaled pen advance in whole pixels.
    pub advance: f32,
    /// Pixels the bitmap reaches below the baseline.
    pub descender: f32,
    pub source: FontRole,
}

impl GlyphEntry {
    pub fn is_empty(&self) -> bool {
        self.size.0 == 0 || self.size.1 == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct GlyphCache<F: Rasterizer, T: GlyphTextures> {
    font: F,
    textures: T,
    entries: LruMap<char, GlyphEntry>,
    format: TextureFormat,
    stats: CacheStats,
}

impl<F: Rasterizer, T: GlyphTextures> GlyphCache<F, T> {
    pub fn new(font: F, textures: T, capacity: usize, format: TextureFormat) -> Self {
        Self {
            font,
            textures,
            entries: LruMap::new(capacity),
            format,
            stats: CacheStats::default(),
        }
    }

    /// Returns the glyph for `character`, rasterizing and uploading it on a
    /// miss. Characters no font can draw come back as empty placeholders.
    ///
    /// Only a failed texture upload is an error.
    pub fn get(&mut self, character: char) -> Result<GlyphEntry> {
        if let Some(entry) = self.entries.get(&character) {
            self.stats.hits += 1;
            return Ok(*entry);
        }
        self.stats.misses += 1;

        // make room before allocating the new texture
        if self.entries.is_full() {
            if let Some((evicted, entry)) = self.entries.pop_lru() {
                self.textures.release(entry.texture);
                self.stats.evictions += 1;
                log::info!(
                    "Glyph cache full ({}), evicted {:?}",
                    self.entries.capacity(),
                    evicted
                );
            }
        }

        let glyph = self.rasterize(character);
        let texture = Texture::from_coverage(&glyph.coverage, glyph.width, glyph.height, self.format);
        let handle = self.textures.upload(&texture)?;

        let entry = GlyphEntry {
            character,
            texture: handle,
            size: (glyph.width, glyph.height),
            bearing: glyph.bearing,
            advance: glyph.advance,
            descender: glyph.descender(),
            source: glyph.source,
        };
        log::debug!(
            "Cached {:?} from {:?} font: {}x{}",
            character,
            entry.source,
            entry.size.0,
            entry.size.1
        );

        self.entries.push(character, entry);
        Ok(entry)
    }

    fn rasterize(&self, character: char) -> RasterizedGlyph {
        match self.font.rasterize(character) {
            Some(glyph) if glyph.coverage.len() == (glyph.width * glyph.height) as usize => glyph,
            Some(glyph) => {
                log::warn!(
                    "Rasterizing {:?} produced {} bytes for a {}x{} bitmap, using a placeholder",
                    character,
                    glyph.coverage.len(),
                    glyph.width,
                    glyph.height
                );
                RasterizedGlyph::placeholder()
            }
            None => {
                log::debug!("No font has a glyph for {:?}", character);
                RasterizedGlyph::placeholder()
            }
        }
    }

    /// Releases every cached texture and empties the cache.
    pub fn invalidate(&mut self) {
        let drained = self.entries.drain();
        if !drained.is_empty() {
            log::debug!("Invalidating {} cached glyphs", drained.len());
        }
        for (_, entry) in drained {
            self.textures.release(entry.texture);
        }
    }

    /// Swaps in a new font. Nothing rasterized with the old one survives.
    pub fn set_font(&mut self, font: F) {
        self.invalidate();
        self.font = font;
    }

    pub fn font(&self) -> &F {
        &self.font
    }

    pub fn textures(&self) -> &T {
        &self.textures
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn contains(&self, character: char) -> bool {
        self.entries.contains(&character)
    }

    /// Looks up a cached glyph without changing its recency.
    pub fn peek(&self, character: char) -> Option<&GlyphEntry> {
        self.entries.peek(&character)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cached characters, most recently used first.
    pub fn cached_characters(&self) -> Vec<char> {
        self.entries.keys().copied().collect()
    }
}

impl<F: Rasterizer, T: GlyphTextures> GlyphSource for GlyphCache<F, T> {
    fn glyph(&mut self, character: char) -> Result<GlyphEntry> {
        self.get(character)
    }
}

impl<F: Rasterizer, T: GlyphTextures> Drop for GlyphCache<F, T> {
    fn drop(&mut self) {
        self.invalidate();
    }
}
