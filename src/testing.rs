//! Fonts and texture stores that need neither font files nor a GPU.

use std::{cell::Cell, collections::HashMap};

use generational_arena::Arena;

use crate::{
    error::{Result, TextError},
    text::font::{Face, FontRole, RasterizedGlyph},
    texture::{GlyphTextures, Texture, TextureHandle},
};

#[derive(Debug, Default)]
pub struct FakeFace {
    glyphs: HashMap<char, RasterizedGlyph>,
    calls: Cell<usize>,
}

impl FakeFace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyph(
        mut self,
        character: char,
        width: u32,
        height: u32,
        bearing: (i32, i32),
        advance: f32,
    ) -> Self {
        self.glyphs.insert(
            character,
            RasterizedGlyph {
                coverage: vec![255; (width * height) as usize],
                width,
                height,
                bearing,
                advance,
                source: FontRole::Primary,
            },
        );
        self
    }

    pub fn with_raw_glyph(mut self, character: char, glyph: RasterizedGlyph) -> Self {
        self.glyphs.insert(character, glyph);
        self
    }

    /// Number of rasterizations performed.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Face for FakeFace {
    fn has_glyph(&self, character: char) -> bool {
        self.glyphs.contains_key(&character)
    }

    fn rasterize(&self, character: char, _px: f32) -> RasterizedGlyph {
        self.calls.set(self.calls.get() + 1);
        self.glyphs
            .get(&character)
            .cloned()
            .unwrap_or_else(RasterizedGlyph::placeholder)
    }
}

/// Records every upload and release.
#[derive(Default)]
pub struct FakeTextures {
    pub live: Arena<Texture>,
    pub uploaded: usize,
    pub released: Vec<TextureHandle>,
    pub fail_uploads: bool,
}

impl FakeTextures {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlyphTextures for FakeTextures {
    fn upload(&mut self, texture: &Texture) -> Result<TextureHandle> {
        if self.fail_uploads {
            return Err(TextError::GpuResource("out of texture memory".into()));
        }
        self.uploaded += 1;
        Ok(TextureHandle(self.live.insert(texture.clone())))
    }

    fn release(&mut self, handle: TextureHandle) {
        assert!(
            self.live.remove(handle.0).is_some(),
            "texture {:?} released twice",
            handle
        );
        self.released.push(handle);
    }
}
