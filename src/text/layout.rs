//! Turns a string into positioned glyph quads.
//!
//! Coordinates are pixels with the origin at the bottom-left of the viewport
//! and Y pointing up. The pen starts on the baseline.

use std::collections::HashSet;

use crate::{error::Result, plain::Plain, text::glyph_cache::GlyphEntry, texture::TextureHandle};

pub const VERTICES_PER_GLYPH: usize = 6;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
}

unsafe impl Plain for TextVertex {}

/// Anything that can hand out glyph metrics and textures by character.
pub trait GlyphSource {
    fn glyph(&mut self, character: char) -> Result<GlyphEntry>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionedQuad {
    pub character: char,
    pub texture: TextureHandle,
    pub vertices: [TextVertex; VERTICES_PER_GLYPH],
}

/// Extent of a laid out string, in scaled pixels.
///
/// `height` is the tallest bitmap. `height_with_descender` spans from the
/// lowest descender to the highest ascender, baseline included.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
    pub height_with_descender: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub quads: Vec<PositionedQuad>,
    pub bounds: BoundingBox,
    /// Pen position after the last glyph.
    pub pen: (f32, f32),
}

#[derive(Default)]
struct Extent {
    height: f32,
    ascent: f32,
    descent: f32,
}

impl Extent {
    fn include(&mut self, glyph: &GlyphEntry) {
        if glyph.is_empty() {
            return;
        }
        self.height = self.height.max(glyph.size.1 as f32);
        self.ascent = self.ascent.max(glyph.bearing.1 as f32);
        self.descent = self.descent.max(glyph.descender);
    }

    fn bounds(&self, width: f32, scale: f32) -> BoundingBox {
        BoundingBox {
            width,
            height: self.height * scale,
            height_with_descender: (self.ascent + self.descent) * scale,
        }
    }
}

/// Two counter-clockwise triangles covering the rectangle whose lower-left
/// corner is `(x, y)`. UV (0, 0) sits at the top-left, matching bitmaps
/// uploaded top row first.
pub fn quad_vertices(x: f32, y: f32, w: f32, h: f32) -> [TextVertex; VERTICES_PER_GLYPH] {
    let top_left = TextVertex {
        pos: [x, y + h],
        uv: [0.0, 0.0],
    };
    let bottom_left = TextVertex {
        pos: [x, y],
        uv: [0.0, 1.0],
    };
    let bottom_right = TextVertex {
        pos: [x + w, y],
        uv: [1.0, 1.0],
    };
    let top_right = TextVertex {
        pos: [x + w, y + h],
        uv: [1.0, 0.0],
    };
    [
        top_left,
        bottom_left,
        bottom_right,
        top_left,
        bottom_right,
        top_right,
    ]
}

fn place(glyph: &GlyphEntry, x: f32, pen_y: f32, scale: f32) -> Option<PositionedQuad> {
    if glyph.is_empty() {
        return None;
    }
    let (w, h) = (glyph.size.0 as f32 * scale, glyph.size.1 as f32 * scale);
    let xpos = x + glyph.bearing.0 as f32 * scale;
    let ypos = pen_y - (glyph.size.1 as i32 - glyph.bearing.1) as f32 * scale;
    Some(PositionedQuad {
        character: glyph.character,
        texture: glyph.texture,
        vertices: quad_vertices(xpos, ypos, w, h),
    })
}

/// Lays out `text` with the pen starting at `(pen_x, pen_y)`.
///
/// Glyphs are fetched one `char` at a time, which rasterizes any not yet
/// cached. Glyphs without pixels (spaces, missing characters) emit no quad
/// but still move the pen.
pub fn layout<S: GlyphSource + ?Sized>(
    source: &mut S,
    text: &str,
    pen_x: f32,
    pen_y: f32,
    scale: f32,
) -> Result<TextLayout> {
    let mut quads = Vec::with_capacity(text.len());
    let mut extent = Extent::default();
    let mut x = pen_x;

    for character in text.chars() {
        let glyph = source.glyph(character)?;
        extent.include(&glyph);
        quads.extend(place(&glyph, x, pen_y, scale));
        x += glyph.advance * scale;
    }

    Ok(TextLayout {
        quads,
        bounds: extent.bounds(x - pen_x, scale),
        pen: (x, pen_y),
    })
}

/// Lays out `text` like [layout], handing quads to `emit` in pieces that
/// each hold at most `max_distinct` different characters.
///
/// With `max_distinct` no larger than the cache capacity, fetching a glyph
/// can only evict characters outside the current piece, so every quad passed
/// to `emit` still has a live texture. Returns the bounds of the whole string.
pub fn layout_segmented<S, E>(
    source: &mut S,
    text: &str,
    pen_x: f32,
    pen_y: f32,
    scale: f32,
    max_distinct: usize,
    mut emit: E,
) -> Result<BoundingBox>
where
    S: GlyphSource + ?Sized,
    E: FnMut(&mut S, &[PositionedQuad]) -> Result<()>,
{
    let max_distinct = max_distinct.max(1);
    let mut quads = Vec::new();
    let mut distinct = HashSet::new();
    let mut extent = Extent::default();
    let mut x = pen_x;

    for character in text.chars() {
        if !distinct.contains(&character) && distinct.len() == max_distinct {
            if !quads.is_empty() {
                emit(source, &quads)?;
                quads.clear();
            }
            distinct.clear();
        }
        distinct.insert(character);

        let glyph = source.glyph(character)?;
        extent.include(&glyph);
        quads.extend(place(&glyph, x, pen_y, scale));
        x += glyph.advance * scale;
    }

    if !quads.is_empty() {
        emit(source, &quads)?;
    }
    Ok(extent.bounds(x - pen_x, scale))
}

/// The bounding box [layout] would report, without building quads.
pub fn measure<S: GlyphSource + ?Sized>(source: &mut S, text: &str, scale: f32) -> Result<BoundingBox> {
    let mut extent = Extent::default();
    let mut width = 0.0;
    for character in text.chars() {
        let glyph = source.glyph(character)?;
        extent.include(&glyph);
        width += glyph.advance * scale;
    }
    Ok(extent.bounds(width, scale))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        testing::{FakeFace, FakeTextures},
        text::{
            font::FontContext,
            glyph_cache::GlyphCache,
        },
        texture::TextureFormat,
    };

    type Cache = GlyphCache<FontContext<FakeFace>, FakeTextures>;

    fn cache() -> Cache {
        let face = FakeFace::new()
            .with_glyph('A', 10, 10, (1, 10), 15.0)
            .with_glyph('g', 8, 12, (0, 8), 9.0)
            .with_glyph('i', 3, 11, (1, 11), 5.0)
            .with_glyph(' ', 0, 0, (0, 0), 6.0);
        let fallback = FakeFace::new().with_glyph('字', 22, 22, (1, 19), 24.0);
        GlyphCache::new(
            FontContext::new(face, fallback, 24),
            FakeTextures::new(),
            16,
            TextureFormat::Alpha8,
        )
    }

    fn corners(quad: &PositionedQuad) -> (f32, f32, f32, f32) {
        let xs = quad.vertices.iter().map(|v| v.pos[0]);
        let ys = quad.vertices.iter().map(|v| v.pos[1]);
        (
            xs.clone().fold(f32::MAX, f32::min),
            ys.clone().fold(f32::MAX, f32::min),
            xs.fold(f32::MIN, f32::max),
            ys.fold(f32::MIN, f32::max),
        )
    }

    #[test]
    fn single_glyph_quad_and_pen() {
        let mut cache = cache();
        let layout = layout(&mut cache, "A", 0.0, 0.0, 1.0).unwrap();

        assert_eq!(layout.pen, (15.0, 0.0));
        assert_eq!(layout.quads.len(), 1);
        assert_eq!(corners(&layout.quads[0]), (1.0, 0.0, 11.0, 10.0));
        assert_eq!(layout.bounds.width, 15.0);
        assert_eq!(layout.bounds.height, 10.0);
    }

    #[test]
    fn scale_and_pen_origin_apply() {
        let mut cache = cache();
        let layout = layout(&mut cache, "AA", 100.0, 50.0, 2.0).unwrap();

        assert_eq!(layout.pen, (160.0, 50.0));
        assert_eq!(corners(&layout.quads[0]), (102.0, 50.0, 122.0, 70.0));
        assert_eq!(corners(&layout.quads[1]), (132.0, 50.0, 152.0, 70.0));
    }

    #[test]
    fn descenders_sit_below_the_baseline() {
        let mut cache = cache();
        let layout = layout(&mut cache, "g", 0.0, 100.0, 1.0).unwrap();
        // 12 tall, 8 above the baseline
        assert_eq!(corners(&layout.quads[0]), (0.0, 96.0, 8.0, 108.0));
    }

    #[test]
    fn spaces_advance_without_quads() {
        let mut cache = cache();
        let layout = layout(&mut cache, "A A", 0.0, 0.0, 1.0).unwrap();
        assert_eq!(layout.quads.len(), 2);
        assert_eq!(layout.pen.0, 36.0);
        assert_eq!(corners(&layout.quads[1]).0, 22.0);
    }

    #[test]
    fn missing_glyphs_are_skipped_with_zero_advance() {
        let mut cache = cache();
        let layout = layout(&mut cache, "A🦀A", 0.0, 0.0, 1.0).unwrap();
        assert_eq!(layout.quads.len(), 2);
        assert_eq!(layout.pen.0, 30.0);
    }

    #[test]
    fn fallback_glyphs_lay_out_like_any_other() {
        let mut cache = cache();
        let layout = layout(&mut cache, "A字", 0.0, 0.0, 1.0).unwrap();
        assert_eq!(layout.quads.len(), 2);
        assert_eq!(layout.quads[1].character, '字');
        assert_eq!(corners(&layout.quads[1]), (16.0, -3.0, 38.0, 19.0));
    }

    #[test]
    fn uvs_map_bitmap_top_row_to_quad_top() {
        let vertices = quad_vertices(0.0, 0.0, 4.0, 2.0);
        for vertex in vertices {
            let expected_v = if vertex.pos[1] == 2.0 { 0.0 } else { 1.0 };
            let expected_u = if vertex.pos[0] == 4.0 { 1.0 } else { 0.0 };
            assert_eq!(vertex.uv, [expected_u, expected_v]);
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise() {
        let vertices = quad_vertices(3.0, 7.0, 5.0, 9.0);
        for triangle in vertices.chunks(3) {
            let [a, b, c] = [triangle[0].pos, triangle[1].pos, triangle[2].pos];
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross > 0.0);
        }
    }

    #[test]
    fn bounding_box_accounts_for_descenders() {
        let mut cache = cache();
        let bounds = measure(&mut cache, "Agi", 1.0).unwrap();
        assert_eq!(bounds.width, 29.0);
        assert_eq!(bounds.height, 12.0);
        // 11 above the baseline ('i') plus 4 below ('g')
        assert_eq!(bounds.height_with_descender, 15.0);

        let scaled = measure(&mut cache, "Agi", 0.5).unwrap();
        assert_relative_eq!(scaled.width, 14.5);
        assert_relative_eq!(scaled.height_with_descender, 7.5);
    }

    #[test]
    fn measure_matches_layout() {
        let mut cache = cache();
        let text = "gA i字";
        let laid_out = layout(&mut cache, text, 12.0, 34.0, 1.5).unwrap();
        let measured = measure(&mut cache, text, 1.5).unwrap();
        assert_relative_eq!(laid_out.bounds.width, measured.width);
        assert_eq!(laid_out.bounds.height, measured.height);
        assert_eq!(laid_out.bounds.height_with_descender, measured.height_with_descender);
    }

    #[test]
    fn empty_text_is_empty_layout() {
        let mut cache = cache();
        let layout = layout(&mut cache, "", 5.0, 5.0, 1.0).unwrap();
        assert!(layout.quads.is_empty());
        assert_eq!(layout.bounds, BoundingBox::default());
        assert_eq!(layout.pen, (5.0, 5.0));
    }

    #[test]
    fn layout_is_deterministic() {
        let mut cache = cache();
        let first = layout(&mut cache, "gig A字", 10.0, 20.0, 1.25).unwrap();
        let second = layout(&mut cache, "gig A字", 10.0, 20.0, 1.25).unwrap();
        assert_eq!(first, second);
    }

    fn small_cache(capacity: usize) -> Cache {
        let face = ('a'..='z').fold(FakeFace::new(), |face, c| face.with_glyph(c, 6, 8, (0, 8), 7.0));
        GlyphCache::new(
            FontContext::new(face, FakeFace::new(), 16),
            FakeTextures::new(),
            capacity,
            TextureFormat::Alpha8,
        )
    }

    #[test]
    fn segments_keep_every_texture_alive_past_cache_capacity() {
        let mut cache = small_cache(4);
        let mut pieces = Vec::new();
        let bounds = layout_segmented(&mut cache, "abcde", 0.0, 0.0, 1.0, 4, |cache, quads| {
            for quad in quads {
                assert!(
                    cache.textures().live.contains(quad.texture.0),
                    "texture for {:?} was released before drawing",
                    quad.character
                );
            }
            pieces.push(quads.iter().map(|quad| quad.character).collect::<String>());
            Ok(())
        })
        .unwrap();

        assert_eq!(pieces, vec!["abcd".to_string(), "e".to_string()]);
        assert_eq!(bounds.width, 35.0);
    }

    #[test]
    fn segments_handle_revisited_characters() {
        let text = "abcabdeafgbbhaic";
        let mut cache = small_cache(3);
        let mut drawn = String::new();
        layout_segmented(&mut cache, text, 0.0, 0.0, 1.0, 3, |cache, quads| {
            assert!(quads
                .iter()
                .all(|quad| cache.textures().live.contains(quad.texture.0)));
            drawn.extend(quads.iter().map(|quad| quad.character));
            Ok(())
        })
        .unwrap();
        assert_eq!(drawn, text);
    }

    #[test]
    fn short_text_is_one_segment_matching_layout() {
        let mut cache = cache();
        let whole = layout(&mut cache, "gA i字", 3.0, 4.0, 1.5).unwrap();

        let mut calls = 0;
        let bounds = layout_segmented(&mut cache, "gA i字", 3.0, 4.0, 1.5, 16, |_, quads| {
            calls += 1;
            assert_eq!(quads, &whole.quads[..]);
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(bounds, whole.bounds);
    }

    #[test]
    fn width_never_shrinks_as_text_grows() {
        let mut cache = cache();
        let text = "Ag i 🦀字 gA";
        let mut previous = 0.0;
        for (end, _) in text.char_indices().skip(1).chain([(text.len(), ' ')]) {
            let width = measure(&mut cache, &text[..end], 0.75).unwrap().width;
            assert!(width >= previous);
            previous = width;
        }
    }
}
