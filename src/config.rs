//! `sketch.toml` loading.
//!
//! Every field has a default, so a partial file (or no file) is fine:
//!
//! ```toml
//! variant = "staged"
//!
//! [text]
//! content = "HELLO"
//! small = false
//!
//! [animation]
//! easing = "ease_out_cubic"
//! ```

use std::path::{Path, PathBuf};

use msdf_layout::{Align, LayoutOptions};
use sdf_shading::{Easing, RevealTimeline, DEFAULT_TIME_STEP};
use serde::Deserialize;

use crate::settings::SketchVariant;

pub const DEFAULT_CONFIG_PATH: &str = "sketch.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "MSDF Text Sketch".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignConfig {
    #[default]
    Left,
    Center,
    Right,
}

impl From<AlignConfig> for Align {
    fn from(align: AlignConfig) -> Self {
        match align {
            AlignConfig::Left => Align::Left,
            AlignConfig::Center => Align::Center,
            AlignConfig::Right => Align::Right,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub content: String,
    /// BMFont JSON descriptor.
    pub font: PathBuf,
    /// MSDF atlas PNG, page 0 of the font.
    pub atlas: PathBuf,
    /// Compile the shader with `IS_SMALL`.
    pub small: bool,
    pub width: Option<f32>,
    pub align: AlignConfig,
    pub letter_spacing: f32,
    pub line_height: Option<f32>,
    pub tab_size: u32,
    pub flip_v: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "HELLO".into(),
            font: PathBuf::from("assets/fonts/Alkatra-msdf.json"),
            atlas: PathBuf::from("assets/fonts/Alkatra-msdf.png"),
            small: false,
            width: None,
            align: AlignConfig::Left,
            letter_spacing: 0.0,
            line_height: None,
            tab_size: 4,
            flip_v: false,
        }
    }
}

impl TextConfig {
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            width: self.width,
            align: self.align.into(),
            letter_spacing: self.letter_spacing,
            line_height: self.line_height,
            tab_size: self.tab_size,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    pub scale: [f32; 3],
    pub offset: [f32; 3],
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            scale: [0.02, -0.02, 0.02],
            offset: [-1.5, 0.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Shader time added per frame.
    pub time_step: f32,
    /// Seconds per reveal band.
    pub duration: f32,
    /// Seconds between band starts.
    pub stagger: f32,
    pub easing: Easing,
    /// Start the reveal timeline on launch (staged variant).
    pub autoplay: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            duration: 1.2,
            stagger: 0.35,
            easing: Easing::default(),
            autoplay: true,
        }
    }
}

impl AnimationConfig {
    pub fn timeline(&self) -> RevealTimeline {
        RevealTimeline::new(self.duration, self.stagger, self.easing)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaneConfig {
    pub visible: bool,
    pub size: [f32; 2],
    pub segments: [u32; 2],
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            visible: false,
            size: [1.5, 1.5],
            segments: [300, 300],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SketchConfig {
    pub variant: SketchVariant,
    pub window: WindowConfig,
    pub text: TextConfig,
    pub mesh: MeshConfig,
    pub animation: AnimationConfig,
    pub plane: PlaneConfig,
}

impl SketchConfig {
    pub fn from_toml_str(source: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path: must exist. No path: `sketch.toml` if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    log::info!("No {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let source = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&source, &path)?;
        log::info!("✓ Loaded config {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.text.content.is_empty() {
            return Err(ConfigError::Invalid("text.content is empty".into()));
        }
        if !(self.animation.time_step.is_finite() && self.animation.time_step >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "animation.time_step must be a non-negative number, got {}",
                self.animation.time_step
            )));
        }
        if self.animation.duration < 0.0 || self.animation.stagger < 0.0 {
            return Err(ConfigError::Invalid(
                "animation.duration and animation.stagger must be non-negative".into(),
            ));
        }
        if self.plane.segments.contains(&0) {
            return Err(ConfigError::Invalid("plane.segments must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<SketchConfig, ConfigError> {
        SketchConfig::from_toml_str(source, Path::new("test.toml"))
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, SketchConfig::default());
        assert_eq!(config.text.content, "HELLO");
        assert_eq!(config.mesh.scale, [0.02, -0.02, 0.02]);
        assert_eq!(config.mesh.offset[0], -1.5);
        assert_eq!(config.animation.time_step, 0.0002);
        assert!(!config.plane.visible);
    }

    #[test]
    fn test_partial_file() {
        let config = parse(
            r#"
            variant = "staged"

            [text]
            content = "HI THERE"
            small = true
            align = "center"
            width = 200.0

            [animation]
            easing = "ease_out_cubic"
            stagger = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.variant, SketchVariant::Staged);
        assert_eq!(config.text.content, "HI THERE");
        assert!(config.text.small);
        assert_eq!(config.text.layout_options().align, Align::Center);
        assert_eq!(config.text.layout_options().width, Some(200.0));
        assert_eq!(config.animation.easing, Easing::EaseOutCubic);
        assert_eq!(config.animation.stagger, 0.1);
        assert_eq!(config.animation.duration, 1.2);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = parse("[text]\ncontnet = \"typo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse("[window]\nwidth = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse("[text]\ncontent = \"\"\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse("[animation]\ntime_step = -1.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse("[plane]\nsegments = [0, 10]\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = SketchConfig::load(Some(Path::new("/definitely/not/sketch.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_timeline_from_config() {
        let timeline = AnimationConfig::default().timeline();
        assert_eq!(timeline.duration, 1.2);
        assert_eq!(timeline.stagger, 0.35);
        assert!(timeline.progress().is_none());
    }
}
