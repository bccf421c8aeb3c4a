//! Hash noise used to roughen reveal edges.
//!
//! Same constants as the shader so a CPU sample predicts what the GPU draws (up to `sin`
//! precision differences between drivers).

use glam::Vec2;

/// GLSL/WGSL `fract`: `x - floor(x)`, always in `[0, 1)` (unlike `f32::fract` for negatives).
#[inline]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep, clamped. Requires `edge0 != edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear remap of `value` from `[min1, max1]` to `[min2, max2]` (no clamping).
#[inline]
pub fn map_range(value: f32, min1: f32, max1: f32, min2: f32, max2: f32) -> f32 {
    min2 + (value - min1) * (max2 - min2) / (max1 - min1)
}

pub fn rand1(n: f32) -> f32 {
    fract(n.sin() * 43758.5453)
}

pub fn rand2(n: Vec2) -> f32 {
    fract(n.dot(Vec2::new(12.9898, 4.1414)).sin() * 43758.5453)
}

/// 1D value noise, linear between integer lattice points.
pub fn noise1(p: f32) -> f32 {
    let fl = p.floor();
    mix(rand1(fl), rand1(fl + 1.0), fract(p))
}

/// 2D value noise over unit cells, smoothstepped bilinear blend.
pub fn noise2(n: Vec2) -> f32 {
    let b = n.floor();
    let f = Vec2::new(
        smoothstep(0.0, 1.0, fract(n.x)),
        smoothstep(0.0, 1.0, fract(n.y)),
    );

    mix(
        mix(rand2(b), rand2(b + Vec2::X), f.x),
        mix(rand2(b + Vec2::Y), rand2(b + Vec2::ONE), f.x),
        f.y,
    )
}
