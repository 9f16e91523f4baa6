use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use fontdue::{Font, FontSettings, LineMetrics, Metrics};

use crate::error::{Result, TextError};

/// Which font of a [FontContext] produced a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontRole {
    Primary,
    Fallback,
    /// Neither font has the character; the glyph is an empty placeholder.
    Missing,
}

/// Coverage bitmap and metrics of one rasterized character.
///
/// `coverage` is row-major, top row first, one byte per pixel. `bearing` is
/// the offset from the pen position on the baseline to the bitmap's top-left
/// corner with Y pointing up.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterizedGlyph {
    pub coverage: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bearing: (i32, i32),
    /// Whole pixels.
    pub advance: f32,
    pub source: FontRole,
}

impl RasterizedGlyph {
    pub fn placeholder() -> Self {
        Self {
            coverage: Vec::new(),
            width: 0,
            height: 0,
            bearing: (0, 0),
            advance: 0.0,
            source: FontRole::Missing,
        }
    }

    /// Pixels of the bitmap below the baseline.
    pub fn descender(&self) -> f32 {
        (self.height as i32 - self.bearing.1).max(0) as f32
    }
}

/// A single font face that can report glyph coverage and rasterize.
pub trait Face {
    fn has_glyph(&self, character: char) -> bool;

    fn rasterize(&self, character: char, px: f32) -> RasterizedGlyph;
}

impl Face for Font {
    fn has_glyph(&self, character: char) -> bool {
        self.lookup_glyph_index(character) != 0
    }

    fn rasterize(&self, character: char, px: f32) -> RasterizedGlyph {
        let (metrics, coverage) = Font::rasterize(self, character, px);
        glyph_from_metrics(&metrics, coverage)
    }
}

fn glyph_from_metrics(metrics: &Metrics, coverage: Vec<u8>) -> RasterizedGlyph {
    let height = metrics.height as i32;
    RasterizedGlyph {
        coverage,
        width: metrics.width as u32,
        height: metrics.height as u32,
        // fontdue's ymin is the bitmap's bottom edge relative to the baseline
        bearing: (metrics.xmin, metrics.ymin + height),
        // whole pixels, truncated like a 26.6 fixed-point shift
        advance: metrics.advance_width.floor(),
        source: FontRole::Primary,
    }
}

/// Produces glyphs for characters, or `None` when no font has them.
pub trait Rasterizer {
    fn rasterize(&self, character: char) -> Option<RasterizedGlyph>;
}

/// A primary font plus the fallback consulted for characters it lacks, both
/// at one pixel size. Changing either means building a new context.
#[derive(Debug)]
pub struct FontContext<F: Face = Font> {
    primary: F,
    fallback: F,
    px: u32,
}

impl<F: Face> FontContext<F> {
    pub fn new(primary: F, fallback: F, px: u32) -> Self {
        Self {
            primary,
            fallback,
            px,
        }
    }

    pub fn px(&self) -> u32 {
        self.px
    }

    pub fn primary(&self) -> &F {
        &self.primary
    }

    /// Opens the primary and fallback faces with `open`. A failing primary is
    /// [TextError::FontLoad], a failing fallback [TextError::FallbackFontLoad].
    pub fn open_with<P, Q, O>(path: P, fallback_path: Q, px: u32, open: O) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        O: Fn(&Path, u32) -> std::result::Result<F, String>,
    {
        let primary = open(path.as_ref(), px).map_err(|reason| TextError::FontLoad {
            path: path.as_ref().to_path_buf(),
            reason,
        })?;
        let fallback =
            open(fallback_path.as_ref(), px).map_err(|reason| TextError::FallbackFontLoad {
                path: fallback_path.as_ref().to_path_buf(),
                reason,
            })?;
        Ok(Self::new(primary, fallback, px))
    }
}

impl<F: Face> Rasterizer for FontContext<F> {
    fn rasterize(&self, character: char) -> Option<RasterizedGlyph> {
        let px = self.px as f32;
        if self.primary.has_glyph(character) {
            let mut glyph = self.primary.rasterize(character, px);
            glyph.source = FontRole::Primary;
            Some(glyph)
        } else if self.fallback.has_glyph(character) {
            let mut glyph = self.fallback.rasterize(character, px);
            glyph.source = FontRole::Fallback;
            Some(glyph)
        } else {
            None
        }
    }
}

impl FontContext<Font> {
    /// Loads `path` as the primary font and `fallback_path` as the fallback,
    /// both at `px` pixels.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(path: P, fallback_path: Q, px: u32) -> Result<Self> {
        let context = Self::open_with(path.as_ref(), fallback_path.as_ref(), px, load_face)?;

        log::info!("Using font: {:?} ({})", path.as_ref(), px);
        log::info!("Using fallback font: {:?} ({})", fallback_path.as_ref(), px);

        Ok(context)
    }

    pub fn line_metrics(&self) -> Option<LineMetrics> {
        self.primary.horizontal_line_metrics(self.px as f32)
    }
}

fn load_face(path: &Path, px: u32) -> std::result::Result<Font, String> {
    let bytes = read_font_bytes(path).map_err(|err| err.to_string())?;
    // collections (.ttc) load their first face
    let settings = FontSettings {
        collection_index: 0,
        scale: px as f32,
        ..FontSettings::default()
    };
    Font::from_bytes(bytes, settings).map_err(|err| err.to_string())
}

fn read_font_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Default fallback font for the current platform.
pub fn default_fallback_font() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Windows\Fonts\msyh.ttc")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/System/Library/Fonts/PingFang.ttc")
    } else {
        PathBuf::from("/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc")
    }
}
