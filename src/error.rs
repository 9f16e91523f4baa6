use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort text setup. Glyph-level problems never show up here:
/// they degrade to placeholder glyphs inside the cache.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Couldn't load font {path:?}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    /// The configured fallback font is unusable. This is a configuration
    /// problem rather than a bad user-chosen font.
    #[error("Couldn't load fallback font {path:?}: {reason}")]
    FallbackFontLoad { path: PathBuf, reason: String },

    #[error("Text shader failed to compile: {0}")]
    ShaderCompile(String),

    #[error("GPU resource error: {0}")]
    GpuResource(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
