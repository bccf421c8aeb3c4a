/// Layout errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("Cannot lay out empty text")]
    EmptyText,

    /// `index` is the position of the character in the input string (in chars, not bytes).
    #[error("Unknown glyph {character:?} at index {index}: the font has no atlas entry for it")]
    UnknownGlyph { character: char, index: usize },
}
