// text drawing, bottom up:
// - fontdue rasterizes glyphs (with a fallback font for anything the primary lacks)
// - the glyph cache keeps one texture per character, evicting the least recently used
// - layout turns a string into textured quads, batch merges neighbouring quads by texture
// - the renderer (crate::render) uploads the vertices once and draws each run

pub mod anchor;
pub mod batch;
pub mod font;
pub mod glyph_cache;
pub mod layout;
