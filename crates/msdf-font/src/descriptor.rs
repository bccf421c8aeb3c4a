use std::collections::HashMap;
use std::path::Path;

use crate::error::{FontError, FontResult};
use crate::json::BmFontJson;

/// Glyph metrics and atlas placement, in font units / atlas pixels.
///
/// Coordinate convention (BMFont):
/// - atlas `x`/`y` are the top-left corner of the glyph rect in the atlas page
/// - `xoffset`/`yoffset` are the bearing from the pen position to the quad's top-left,
///   y grows down
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub xoffset: f32,
    pub yoffset: f32,
    pub xadvance: f32,
    pub page: u32,
}

impl Glyph {
    /// A glyph with an atlas rect and advance, no bearing, on page 0.
    pub fn new(id: u32, rect: [f32; 4], xadvance: f32) -> Self {
        Self {
            id,
            x: rect[0],
            y: rect[1],
            width: rect[2],
            height: rect[3],
            xoffset: 0.0,
            yoffset: 0.0,
            xadvance,
            page: 0,
        }
    }

    pub fn with_offset(mut self, xoffset: f32, yoffset: f32) -> Self {
        self.xoffset = xoffset;
        self.yoffset = yoffset;
        self
    }
}

/// Line metrics shared by every glyph of the font.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommonMetrics {
    pub line_height: f32,
    /// Distance from the top of a line to the baseline.
    pub base: f32,
    /// Atlas page width in pixels.
    pub scale_w: u32,
    /// Atlas page height in pixels.
    pub scale_h: u32,
}

/// How the distance field was generated.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceField {
    pub field_type: String,
    /// Distance range in atlas pixels.
    pub distance_range: f32,
}

impl Default for DistanceField {
    fn default() -> Self {
        Self {
            field_type: "msdf".to_string(),
            distance_range: 4.0,
        }
    }
}

/// An immutable MSDF font: glyph table, line metrics and kerning.
#[derive(Clone, Debug)]
pub struct FontDescriptor {
    face: String,
    size: f32,
    common: CommonMetrics,
    distance_field: DistanceField,
    pages: Vec<String>,
    glyphs: HashMap<char, Glyph>,
    kernings: HashMap<(char, char), f32>,
}

impl FontDescriptor {
    /// Build a descriptor directly from parts.
    pub fn new(
        common: CommonMetrics,
        glyphs: impl IntoIterator<Item = (char, Glyph)>,
        kernings: impl IntoIterator<Item = ((char, char), f32)>,
    ) -> FontResult<Self> {
        validate_common(&common)?;

        Ok(Self {
            face: String::new(),
            size: common.line_height,
            common,
            distance_field: DistanceField::default(),
            pages: Vec::new(),
            glyphs: glyphs.into_iter().collect(),
            kernings: kernings.into_iter().collect(),
        })
    }

    /// Parse a BMFont JSON document.
    pub fn from_json_str(json: &str) -> FontResult<Self> {
        let raw: BmFontJson = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse a BMFont JSON document from raw bytes.
    pub fn from_json_slice(bytes: &[u8]) -> FontResult<Self> {
        let raw: BmFontJson = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Load a BMFont JSON file from disk.
    pub fn load(path: impl AsRef<Path>) -> FontResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading font descriptor from: {:?}", path);

        let data = std::fs::read(path)?;
        let font = Self::from_json_slice(&data)?;

        log::info!(
            "✓ Loaded font '{}' ({} glyphs, {} kerning pairs) from {:?}",
            font.face,
            font.glyphs.len(),
            font.kernings.len(),
            path
        );

        Ok(font)
    }

    fn from_raw(raw: BmFontJson) -> FontResult<Self> {
        let common = CommonMetrics {
            line_height: raw.common.line_height,
            base: raw.common.base,
            scale_w: raw.common.scale_w,
            scale_h: raw.common.scale_h,
        };
        validate_common(&common)?;

        let page_count = if raw.pages.is_empty() {
            raw.common.pages as usize
        } else {
            raw.pages.len()
        };

        let mut glyphs = HashMap::with_capacity(raw.chars.len());
        for c in raw.chars {
            let character = to_char(c.id)?;
            if c.page as usize >= page_count {
                return Err(FontError::MissingPage {
                    character,
                    page: c.page,
                    pages: page_count,
                });
            }

            glyphs.insert(
                character,
                Glyph {
                    id: c.id,
                    x: c.x,
                    y: c.y,
                    width: c.width,
                    height: c.height,
                    xoffset: c.xoffset,
                    yoffset: c.yoffset,
                    xadvance: c.xadvance,
                    page: c.page,
                },
            );
        }

        let mut kernings = HashMap::with_capacity(raw.kernings.len());
        for k in raw.kernings {
            kernings.insert((to_char(k.first)?, to_char(k.second)?), k.amount);
        }

        let distance_field = raw
            .distance_field
            .map(|df| DistanceField {
                field_type: df.field_type,
                distance_range: df.distance_range,
            })
            .unwrap_or_default();

        if distance_field.field_type != "msdf" {
            log::warn!(
                "Font '{}' uses a '{}' distance field; the shader expects msdf",
                raw.info.face,
                distance_field.field_type
            );
        }

        Ok(Self {
            face: raw.info.face,
            size: raw.info.size,
            common,
            distance_field,
            pages: raw.pages,
            glyphs,
            kernings,
        })
    }

    pub fn face(&self) -> &str {
        &self.face
    }

    /// Nominal font size the atlas was generated at.
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn common(&self) -> &CommonMetrics {
        &self.common
    }

    pub fn line_height(&self) -> f32 {
        self.common.line_height
    }

    pub fn base(&self) -> f32 {
        self.common.base
    }

    /// Atlas page size in pixels: (width, height).
    pub fn atlas_size(&self) -> [u32; 2] {
        [self.common.scale_w, self.common.scale_h]
    }

    pub fn distance_field(&self) -> &DistanceField {
        &self.distance_field
    }

    /// Atlas page file names, relative to the descriptor.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Kerning adjustment between `first` and `second`, 0 when the pair has none.
    pub fn kerning(&self, first: char, second: char) -> f32 {
        self.kernings
            .get(&(first, second))
            .copied()
            .unwrap_or(0.0)
    }
}

fn to_char(id: u32) -> FontResult<char> {
    char::from_u32(id).ok_or(FontError::InvalidCodepoint(id))
}

fn validate_common(common: &CommonMetrics) -> FontResult<()> {
    if common.scale_w == 0 || common.scale_h == 0 {
        return Err(FontError::InvalidAtlasSize {
            width: common.scale_w,
            height: common.scale_h,
        });
    }
    if !(common.line_height > 0.0) {
        return Err(FontError::InvalidLineHeight(common.line_height));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT_JSON: &str = r#"{
        "pages": ["atlas.png"],
        "chars": [
            {"id": 72, "index": 1, "char": "H", "x": 0, "y": 0, "width": 20, "height": 30,
             "xoffset": 1, "yoffset": 4, "xadvance": 10, "chnl": 15, "page": 0},
            {"id": 73, "index": 2, "char": "I", "x": 20, "y": 0, "width": 8, "height": 30,
             "xoffset": 0, "yoffset": 4, "xadvance": 4, "chnl": 15, "page": 0}
        ],
        "info": {"face": "Test", "size": 42, "padding": [2, 2, 2, 2]},
        "common": {"lineHeight": 50, "base": 40, "scaleW": 256, "scaleH": 128, "pages": 1, "packed": 0},
        "distanceField": {"fieldType": "msdf", "distanceRange": 4},
        "kernings": [{"first": 72, "second": 73, "amount": -1.5}]
    }"#;

    #[test]
    fn test_parse_bmfont_json() {
        let font = FontDescriptor::from_json_str(FONT_JSON).unwrap();

        assert_eq!(font.face(), "Test");
        assert_eq!(font.size(), 42.0);
        assert_eq!(font.glyph_count(), 2);
        assert_eq!(font.atlas_size(), [256, 128]);
        assert_eq!(font.line_height(), 50.0);
        assert_eq!(font.base(), 40.0);
        assert_eq!(font.pages(), &["atlas.png".to_string()]);
        assert_eq!(font.distance_field().distance_range, 4.0);

        let h = font.glyph('H').unwrap();
        assert_eq!(h.xadvance, 10.0);
        assert_eq!(h.xoffset, 1.0);
        assert_eq!(h.width, 20.0);
    }

    #[test]
    fn test_kerning_lookup_is_directional() {
        let font = FontDescriptor::from_json_str(FONT_JSON).unwrap();

        assert_eq!(font.kerning('H', 'I'), -1.5);
        assert_eq!(font.kerning('I', 'H'), 0.0);
        assert_eq!(font.kerning('H', 'H'), 0.0);
    }

    #[test]
    fn test_missing_glyph_is_none() {
        let font = FontDescriptor::from_json_str(FONT_JSON).unwrap();
        assert!(font.glyph('Z').is_none());
    }

    #[test]
    fn test_rejects_out_of_range_page() {
        let json = FONT_JSON.replace(
            r#""xadvance": 4, "chnl": 15, "page": 0"#,
            r#""xadvance": 4, "chnl": 15, "page": 3"#,
        );

        match FontDescriptor::from_json_str(&json) {
            Err(FontError::MissingPage {
                character, page, ..
            }) => {
                assert_eq!(character, 'I');
                assert_eq!(page, 3);
            }
            other => panic!("expected MissingPage, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_atlas_size() {
        let json = FONT_JSON.replace(r#""scaleW": 256"#, r#""scaleW": 0"#);
        assert!(matches!(
            FontDescriptor::from_json_str(&json),
            Err(FontError::InvalidAtlasSize { width: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            FontDescriptor::from_json_str("{ not json"),
            Err(FontError::Json(_))
        ));
    }

    #[test]
    fn test_programmatic_descriptor() {
        let common = CommonMetrics {
            line_height: 20.0,
            base: 16.0,
            scale_w: 64,
            scale_h: 64,
        };
        let font = FontDescriptor::new(
            common,
            [('a', Glyph::new('a' as u32, [0.0, 0.0, 8.0, 8.0], 9.0))],
            [(('a', 'a'), 2.0)],
        )
        .unwrap();

        assert_eq!(font.glyph('a').unwrap().xadvance, 9.0);
        assert_eq!(font.kerning('a', 'a'), 2.0);
        assert_eq!(font.distance_field().field_type, "msdf");
    }
}
