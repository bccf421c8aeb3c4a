//! Serde mirror of the BMFont JSON layout written by `msdf-bmfont-xml`.
//!
//! Only the fields the layout needs are modelled; unknown keys are ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct BmFontJson {
    #[serde(default)]
    pub pages: Vec<String>,
    pub chars: Vec<CharJson>,
    #[serde(default)]
    pub info: InfoJson,
    pub common: CommonJson,
    #[serde(default, rename = "distanceField")]
    pub distance_field: Option<DistanceFieldJson>,
    #[serde(default)]
    pub kernings: Vec<KerningJson>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharJson {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub xoffset: f32,
    #[serde(default)]
    pub yoffset: f32,
    pub xadvance: f32,
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InfoJson {
    #[serde(default)]
    pub face: String,
    #[serde(default)]
    pub size: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommonJson {
    pub line_height: f32,
    pub base: f32,
    pub scale_w: u32,
    pub scale_h: u32,
    #[serde(default = "default_pages")]
    pub pages: u32,
}

fn default_pages() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DistanceFieldJson {
    pub field_type: String,
    pub distance_range: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KerningJson {
    pub first: u32,
    pub second: u32,
    pub amount: f32,
}
