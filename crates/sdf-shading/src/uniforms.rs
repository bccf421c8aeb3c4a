//! Uniform block of the MSDF text shader.

use bytemuck::{Pod, Zeroable};

use crate::color::{mocha, Color};

/// Number of independently progressing reveal bands.
pub const REVEAL_BANDS: usize = 4;

/// Uniforms for GPU. Mirrors `TextUniforms` in `msdf_text.wgsl` field by field.
///
/// Colors are `vec4` to keep WGSL uniform alignment trivial; only `rgb` is read.
/// Reveal bands gate the layers back to front:
/// - band 0: fill in `reveal_colors[0]`
/// - band 1: fill in `reveal_colors[1]`
/// - band 2: fill in `color`
/// - band 3: stroke border in `stroke_color`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShaderUniformSet {
    pub color: [f32; 4],
    pub stroke_color: [f32; 4],
    pub reveal_colors: [[f32; 4]; 2],
    /// Reveal progress per band, 0 = hidden, 1 = revealed.
    pub progress: [f32; 4],
    pub time: f32,
    pub opacity: f32,
    /// Edge threshold for the small-text smoothstep path.
    pub threshold: f32,
    /// Fragments with coverage below this are discarded.
    pub alpha_test: f32,
    pub stroke_outset_width: f32,
    pub stroke_inset_width: f32,
    /// Half width of the reveal edge, in layout uv.
    pub reveal_softness: f32,
    /// Noise cells per layout uv unit along the reveal edge.
    pub noise_scale: f32,
}

impl Default for ShaderUniformSet {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0xffffff).to_array(),
            stroke_color: Color::from_hex(0x00ff00).to_array(),
            reveal_colors: [mocha::MAUVE.to_array(), mocha::PEACH.to_array()],
            progress: [1.0; REVEAL_BANDS],
            time: 0.0,
            opacity: 1.0,
            threshold: 0.05,
            alpha_test: 0.01,
            stroke_outset_width: 0.0,
            stroke_inset_width: 0.3,
            reveal_softness: 0.05,
            noise_scale: 12.0,
        }
    }
}

impl ShaderUniformSet {
    pub fn strokes_enabled(&self) -> bool {
        self.stroke_outset_width + self.stroke_inset_width > 0.0
    }

    pub fn with_progress(mut self, progress: [f32; REVEAL_BANDS]) -> Self {
        self.progress = progress;
        self
    }
}

/// Uniforms for the noise/distortion plane (`noise_plane.wgsl`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PlaneUniforms {
    pub time: f32,
    pub progress: f32,
    pub _padding: [f32; 2],
}
