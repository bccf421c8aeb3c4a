/// Result type for font descriptor operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors raised while loading or validating a font descriptor
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glyph id {0} is not a valid Unicode scalar value")]
    InvalidCodepoint(u32),

    #[error("Glyph {character:?} references page {page}, but the font has {pages} page(s)")]
    MissingPage {
        character: char,
        page: u32,
        pages: usize,
    },

    #[error("Invalid atlas size {width}x{height}")]
    InvalidAtlasSize { width: u32, height: u32 },

    #[error("Invalid line height {0}")]
    InvalidLineHeight(f32),
}
