//! Backend-agnostic MSDF text layout and quad geometry.
//!
//! # Pipeline
//! 1. [`layout`] turns a [`TextLayoutRequest`] (text + [`msdf_font::FontDescriptor`] + options)
//!    into a [`LayoutResult`]: one [`GlyphPlacement`] per non-break character, in input order,
//!    each stamped with per-line / per-word [`GlyphAttributes`].
//! 2. [`build_geometry`] turns the layout into a [`GeometryBuffer`]: four [`TextVertex`] and six
//!    indices per glyph, attributes copied onto every vertex of the quad.
//!
//! Layout space: x grows right, y grows down, line `i` starts at `i * line_height`.
//! Renderers typically flip y with a negative mesh scale.
//!
//! NOTE: This crate does not touch the GPU. Vertex layouts and uploads live in `msdf-renderer`.

mod error;
mod geometry;
mod layout;

pub use error::*;
pub use geometry::*;
pub use layout::*;
