//! # SDF shading
//!
//! CPU reference of the MSDF text fragment stage, plus the uniform block it reads and the
//! animation state that drives it.
//!
//! Every function in [`shading`] and [`noise`] has a 1:1 counterpart in
//! `msdf-renderer/src/shaders/msdf_text.wgsl`; keep them in sync.

pub mod animation;
pub mod color;
pub mod noise;
pub mod shading;
pub mod uniforms;

pub use animation::*;
pub use color::*;
pub use noise::*;
pub use shading::*;
pub use uniforms::*;
