//! # MSDF Renderer
//!
//! WGPU side of the sketch: camera, atlas loading, versioned shader assets and the two
//! pipelines (MSDF text, noise plane).

pub mod atlas;
pub mod camera;
pub mod depth;
pub mod plane;
pub mod shader_asset;
pub mod text_renderer;
pub mod vertex;

pub use atlas::*;
pub use camera::*;
pub use depth::*;
pub use plane::*;
pub use shader_asset::*;
pub use text_renderer::*;
pub use vertex::*;
