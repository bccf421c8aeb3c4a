//! BMFont-style font descriptors for MSDF text rendering.
//!
//! Fonts are produced offline (e.g. by `msdf-bmfont-xml`) as a JSON document plus one or more
//! atlas pages. This crate only deals with the JSON side:
//! - glyph metrics (advance, bearing) and atlas rectangles keyed by `char`
//! - line metrics (`lineHeight`, `base`) and atlas size (`scaleW`, `scaleH`)
//! - kerning pairs
//!
//! The atlas image itself is loaded by the renderer.

mod descriptor;
mod error;
mod json;

pub use descriptor::*;
pub use error::*;
