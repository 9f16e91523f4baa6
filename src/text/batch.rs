use itertools::Itertools;

use crate::{
    text::layout::{PositionedQuad, TextVertex, VERTICES_PER_GLYPH},
    texture::TextureHandle,
};

/// A contiguous range of the vertex buffer drawn with one texture bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureRun {
    pub texture: TextureHandle,
    pub start: u32,
    pub count: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub vertices: Vec<TextVertex>,
    pub runs: Vec<TextureRun>,
}

impl Batch {
    pub fn glyph_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_GLYPH
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Flattens quads into one vertex list, merging neighbours that share a
/// texture into a single run. Layout order is preserved, so the runs cover
/// the vertex list from start to end without gaps.
pub fn batch(quads: &[PositionedQuad]) -> Batch {
    let vertices = quads
        .iter()
        .flat_map(|quad| quad.vertices)
        .collect_vec();

    let mut runs = Vec::new();
    let mut start = 0;
    for (texture, group) in &quads.iter().group_by(|quad| quad.texture) {
        let count = (group.count() * VERTICES_PER_GLYPH) as u32;
        runs.push(TextureRun {
            texture,
            start,
            count,
        });
        start += count;
    }

    Batch { vertices, runs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{FakeFace, FakeTextures},
        text::{font::FontContext, glyph_cache::GlyphCache, layout::layout},
        texture::TextureFormat,
    };

    fn cache() -> GlyphCache<FontContext<FakeFace>, FakeTextures> {
        let face = "abcdefghijklmnopqrstuvwxyz"
            .chars()
            .fold(FakeFace::new(), |face, c| face.with_glyph(c, 6, 8, (0, 8), 7.0))
            .with_glyph(' ', 0, 0, (0, 0), 4.0);
        GlyphCache::new(
            FontContext::new(face, FakeFace::new(), 16),
            FakeTextures::new(),
            64,
            TextureFormat::Alpha8,
        )
    }

    fn runs_for(text: &str) -> Batch {
        let mut cache = cache();
        let layout = layout(&mut cache, text, 0.0, 0.0, 1.0).unwrap();
        batch(&layout.quads)
    }

    fn assert_partition(batch: &Batch) {
        let mut expected_start = 0;
        for run in &batch.runs {
            assert_eq!(run.start, expected_start);
            assert!(run.count > 0);
            assert_eq!(run.count as usize % VERTICES_PER_GLYPH, 0);
            expected_start += run.count;
        }
        assert_eq!(expected_start as usize, batch.vertices.len());
    }

    #[test]
    fn repeated_neighbours_share_a_run() {
        let batch = runs_for("aabccc");
        assert_eq!(
            batch.runs.iter().map(|run| run.count).collect_vec(),
            vec![12, 6, 18]
        );
        assert_partition(&batch);
    }

    #[test]
    fn non_adjacent_repeats_get_separate_runs() {
        let batch = runs_for("aba");
        assert_eq!(batch.runs.len(), 3);
        assert_eq!(batch.runs[0].texture, batch.runs[2].texture);
        assert_partition(&batch);
    }

    #[test]
    fn vertex_count_is_six_per_visible_glyph() {
        let text = "hello world  again";
        let batch = runs_for(text);
        let visible = text.chars().filter(|c| *c != ' ').count();
        let total = batch.runs.iter().map(|run| run.count as usize).sum::<usize>();
        assert_eq!(total, visible * VERTICES_PER_GLYPH);
        assert_eq!(batch.glyph_count(), visible);
        assert_partition(&batch);
    }

    #[test]
    fn spaces_between_identical_glyphs_merge_runs() {
        // the space has no quad, so both l's are neighbours in the buffer
        let batch = runs_for("l l");
        assert_eq!(batch.runs.len(), 1);
        assert_eq!(batch.runs[0].count, 12);
    }

    #[test]
    fn runs_follow_layout_order() {
        let mut cache = cache();
        let layout = layout(&mut cache, "abc", 0.0, 0.0, 1.0).unwrap();
        let batch = batch(&layout.quads);
        for (run, quad) in batch.runs.iter().zip(&layout.quads) {
            assert_eq!(run.texture, quad.texture);
            assert_eq!(
                batch.vertices[run.start as usize..(run.start + run.count) as usize],
                quad.vertices[..]
            );
        }
    }

    #[test]
    fn nothing_to_draw() {
        let batch = runs_for("   ");
        assert!(batch.is_empty());
        assert!(batch.runs.is_empty());
    }
}
