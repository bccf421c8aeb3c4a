//! MSDF fragment math.
//!
//! Per fragment:
//! 1. median of the three distance channels
//! 2. minus 0.5 -> signed distance (positive inside)
//! 3. signed distance -> anti-aliased coverage (screen-space gradient, or fixed smoothstep for
//!    small text)
//! 4. optional outline band from an outset and an inset coverage
//! 5. alpha test
//! 6. reveal-gated layers composited back to front

use glam::{Vec2, Vec3};

use crate::noise::{noise2, smoothstep};
use crate::uniforms::{ShaderUniformSet, REVEAL_BANDS};

/// Half-width of the fixed smoothstep used for small text (`sqrt(2) / 2`).
pub const AFWIDTH: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Share of the reveal coordinate that comes from noise rather than `layout_uv.x`.
pub const REVEAL_NOISE_AMPLITUDE: f32 = 0.15;

/// How signed distance becomes coverage. On the GPU this is the `IS_SMALL` override constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlphaMode {
    /// `fwidth` is the screen-space rate of change of the signed distance.
    Gradient { fwidth: f32 },
    /// Fixed-width smoothstep around the threshold; for glyphs a few pixels tall.
    Small,
}

/// Interpolated inputs of one fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentInput {
    /// Atlas sample, rgb.
    pub texel: Vec3,
    pub layout_uv: Vec2,
}

/// Outset/inset coverages and their product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeMasks {
    pub outset: f32,
    pub inset: f32,
    pub border: f32,
}

#[inline]
pub fn median(r: f32, g: f32, b: f32) -> f32 {
    r.max(g).min(b).max(r.min(g))
}

#[inline]
pub fn signed_distance(texel: Vec3) -> f32 {
    median(texel.x, texel.y, texel.z) - 0.5
}

pub fn coverage(sd: f32, mode: AlphaMode, threshold: f32) -> f32 {
    match mode {
        AlphaMode::Gradient { fwidth } => (sd / fwidth.max(1e-6) + 0.5).clamp(0.0, 1.0),
        AlphaMode::Small => smoothstep(threshold - AFWIDTH, threshold + AFWIDTH, sd),
    }
}

pub fn stroke_masks(
    sd: f32,
    mode: AlphaMode,
    threshold: f32,
    outset_width: f32,
    inset_width: f32,
) -> StrokeMasks {
    let outset = coverage(sd + outset_width * 0.5, mode, threshold);
    let inset = 1.0 - coverage(sd - inset_width * 0.5, mode, threshold);

    StrokeMasks {
        outset,
        inset,
        border: outset * inset,
    }
}

/// Reveal mask of one band at `layout_uv`: 0 hidden, 1 revealed.
///
/// Progress is clamped to [0, 1]. The edge sweeps from `-2w` (progress 0) to `1 + 2w`
/// (progress 1), so the soft band is fully outside `[0, 1]` at both ends regardless of noise.
pub fn reveal_mask(progress: f32, layout_uv: Vec2, band: u32, softness: f32, noise_scale: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    let w = softness.max(1e-4);

    let n = noise2(layout_uv * noise_scale + Vec2::splat(band as f32 * 17.0));
    let x = layout_uv.x.clamp(0.0, 1.0) * (1.0 - REVEAL_NOISE_AMPLITUDE) + n * REVEAL_NOISE_AMPLITUDE;

    let edge = p * (1.0 + 4.0 * w) - 2.0 * w;
    1.0 - smoothstep(edge - w, edge + w, x)
}

pub fn reveal_masks(uniforms: &ShaderUniformSet, layout_uv: Vec2) -> [f32; REVEAL_BANDS] {
    std::array::from_fn(|band| {
        reveal_mask(
            uniforms.progress[band],
            layout_uv,
            band as u32,
            uniforms.reveal_softness,
            uniforms.noise_scale,
        )
    })
}

/// Porter-Duff "over", back to front. Returns straight (non-premultiplied) rgb and alpha.
pub fn composite_over(layers: &[(Vec3, f32)]) -> (Vec3, f32) {
    let mut rgb = Vec3::ZERO;
    let mut alpha = 0.0;

    for &(color, a) in layers {
        let a = a.clamp(0.0, 1.0);
        rgb = color * a + rgb * (1.0 - a);
        alpha = a + alpha * (1.0 - a);
    }

    if alpha > 0.0 {
        (rgb / alpha, alpha)
    } else {
        (Vec3::ZERO, 0.0)
    }
}

/// Full fragment stage. `None` means the fragment is discarded.
pub fn shade_fragment(
    input: &FragmentInput,
    uniforms: &ShaderUniformSet,
    mode: AlphaMode,
) -> Option<[f32; 4]> {
    let sd = signed_distance(input.texel);
    let alpha = coverage(sd, mode, uniforms.threshold);
    let strokes = stroke_masks(
        sd,
        mode,
        uniforms.threshold,
        uniforms.stroke_outset_width,
        uniforms.stroke_inset_width,
    );

    if alpha < uniforms.alpha_test {
        return None;
    }

    let border = if uniforms.strokes_enabled() {
        strokes.border
    } else {
        0.0
    };
    let masks = reveal_masks(uniforms, input.layout_uv);
    let rgb = |c: [f32; 4]| Vec3::new(c[0], c[1], c[2]);

    let (color, a) = composite_over(&[
        (rgb(uniforms.reveal_colors[0]), alpha * masks[0]),
        (rgb(uniforms.reveal_colors[1]), alpha * masks[1]),
        (rgb(uniforms.color), alpha * masks[2]),
        (rgb(uniforms.stroke_color), border * masks[3]),
    ]);

    Some([color.x, color.y, color.z, a * uniforms.opacity])
}
