use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::layout::{GlyphAttributes, LayoutResult};

/// Vertex format for MSDF text quads.
///
/// Positions are in layout space (x right, y down, z = 0).
/// UVs are normalized texture coordinates into the MSDF atlas.
/// `layout_uv` is the vertex position normalized by the layout extent, in `[0, 1]`.
/// Classification attributes are stored as floats because that is what the shader consumes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub layout_uv: [f32; 2],
    pub line_index: f32,
    pub line_letter_index: f32,
    pub line_letters_total: f32,
    pub line_word_index: f32,
    pub line_words_total: f32,
    pub word_index: f32,
    pub letter_index: f32,
}

impl TextVertex {
    fn new(position: [f32; 2], uv: [f32; 2], layout_uv: [f32; 2], a: &GlyphAttributes) -> Self {
        Self {
            position: [position[0], position[1], 0.0],
            uv,
            layout_uv,
            line_index: a.line_index as f32,
            line_letter_index: a.line_letter_index as f32,
            line_letters_total: a.line_letters_total as f32,
            line_word_index: a.line_word_index as f32,
            line_words_total: a.line_words_total as f32,
            word_index: a.word_index as f32,
            letter_index: a.letter_index as f32,
        }
    }
}

/// Geometry construction options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometryOptions {
    /// Map `v -> 1 - v`, for textures with a bottom-left origin.
    pub flip_v: bool,
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Flattened quad mesh for a laid-out text. Read-only after construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffer {
    pub vertices: Vec<TextVertex>,
    pub indices: Vec<u32>,
}

pub const VERTICES_PER_GLYPH: usize = 4;
pub const INDICES_PER_GLYPH: usize = 6;

impl GeometryBuffer {
    pub fn glyph_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_GLYPH
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Min/max reduction over vertex positions. `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut positions = self.vertices.iter().map(|v| Vec3::from_array(v.position));
        let first = positions.next()?;

        let (min, max) = positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Aabb { min, max })
    }

    /// Sphere around the box center enclosing every vertex: (center, radius).
    pub fn bounding_sphere(&self) -> Option<(Vec3, f32)> {
        let center = self.bounding_box()?.center();
        let radius_sq = self
            .vertices
            .iter()
            .map(|v| Vec3::from_array(v.position).distance_squared(center))
            .fold(0.0, f32::max);

        Some((center, radius_sq.sqrt()))
    }
}

/// Emit one quad (4 vertices, 2 triangles) per glyph placement.
pub fn build_geometry(layout: &LayoutResult, options: GeometryOptions) -> GeometryBuffer {
    let glyph_count = layout.glyphs.len();
    let mut vertices = Vec::with_capacity(glyph_count * VERTICES_PER_GLYPH);
    let mut indices = Vec::with_capacity(glyph_count * INDICES_PER_GLYPH);

    let inv_w = if layout.width > 0.0 { 1.0 / layout.width } else { 0.0 };
    let inv_h = if layout.height > 0.0 { 1.0 / layout.height } else { 0.0 };

    let flip = |v: f32| if options.flip_v { 1.0 - v } else { v };

    for glyph in &layout.glyphs {
        let [x, y] = glyph.position;
        let [w, h] = glyph.size;
        let [u0, v0] = glyph.uv.min;
        let [u1, v1] = glyph.uv.max;

        let corners = [
            ([x, y], [u0, flip(v0)]),
            ([x + w, y], [u1, flip(v0)]),
            ([x + w, y + h], [u1, flip(v1)]),
            ([x, y + h], [u0, flip(v1)]),
        ];

        let base = vertices.len() as u32;
        for (position, uv) in corners {
            let layout_uv = [position[0] * inv_w, position[1] * inv_h];
            vertices.push(TextVertex::new(position, uv, layout_uv, &glyph.attributes));
        }

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    GeometryBuffer { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::test_font;
    use crate::layout::{layout, LayoutOptions, TextLayoutRequest};
    use approx::assert_relative_eq;

    fn geometry_for(text: &str, options: GeometryOptions) -> GeometryBuffer {
        let font = test_font(&[]);
        let result = layout(&TextLayoutRequest::new(text, &font)).unwrap();
        build_geometry(&result, options)
    }

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<TextVertex>(), 14 * 4);
    }

    #[test]
    fn test_counts_follow_glyph_count() {
        let geometry = geometry_for("HI\nH I", GeometryOptions::default());

        assert_eq!(geometry.glyph_count(), 5);
        assert_eq!(geometry.vertices.len(), 20);
        assert_eq!(geometry.indices.len(), 30);
        assert!(geometry
            .indices
            .iter()
            .all(|&i| (i as usize) < geometry.vertices.len()));
    }

    #[test]
    fn test_quad_corners_and_indices() {
        let geometry = geometry_for("HI", GeometryOptions::default());
        let positions: Vec<[f32; 3]> = geometry.vertices[4..8].iter().map(|v| v.position).collect();

        assert_eq!(
            positions,
            vec![
                [10.0, 0.0, 0.0],
                [14.0, 0.0, 0.0],
                [14.0, 16.0, 0.0],
                [10.0, 16.0, 0.0]
            ]
        );
        assert_eq!(&geometry.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_attributes_copied_to_every_vertex() {
        let geometry = geometry_for("H\nIH", GeometryOptions::default());

        for quad in geometry.vertices.chunks(VERTICES_PER_GLYPH) {
            assert!(quad.iter().all(|v| v.letter_index == quad[0].letter_index));
            assert!(quad.iter().all(|v| v.line_index == quad[0].line_index));
            assert!(quad
                .iter()
                .all(|v| v.line_letters_total == quad[0].line_letters_total));
        }

        let last = &geometry.vertices[8];
        assert_eq!(last.line_index, 1.0);
        assert_eq!(last.line_letter_index, 1.0);
        assert_eq!(last.line_letters_total, 2.0);
        assert_eq!(last.letter_index, 2.0);
    }

    #[test]
    fn test_uvs_and_flip() {
        let plain = geometry_for("I", GeometryOptions::default());
        assert_eq!(plain.vertices[0].uv, [0.25, 0.0]);
        assert_eq!(plain.vertices[2].uv, [0.3125, 0.25]);

        let flipped = geometry_for("I", GeometryOptions { flip_v: true });
        assert_eq!(flipped.vertices[0].uv, [0.25, 1.0]);
        assert_eq!(flipped.vertices[2].uv, [0.3125, 0.75]);
    }

    #[test]
    fn test_layout_uv_spans_layout() {
        let geometry = geometry_for("HI", GeometryOptions::default());

        // Layout is 14 wide, 20 tall.
        assert_relative_eq!(geometry.vertices[0].layout_uv[0], 0.0);
        assert_relative_eq!(geometry.vertices[5].layout_uv[0], 1.0);
        assert_relative_eq!(geometry.vertices[2].layout_uv[1], 0.8);
    }

    #[test]
    fn test_bounding_volumes() {
        let geometry = geometry_for("HI", GeometryOptions::default());
        let aabb = geometry.bounding_box().unwrap();

        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::new(14.0, 16.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(7.0, 8.0, 0.0));

        let (center, radius) = geometry.bounding_sphere().unwrap();
        assert_eq!(center, aabb.center());
        assert_relative_eq!(radius, (7.0f32 * 7.0 + 8.0 * 8.0).sqrt());
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        let geometry = geometry_for("\n", GeometryOptions::default());
        assert_eq!(geometry.glyph_count(), 0);
        assert!(geometry.bounding_box().is_none());
        assert!(geometry.bounding_sphere().is_none());
    }
}
