//! Typed sketch settings and the slider bindings that edit them.

use std::ops::RangeInclusive;

use sdf_shading::{mocha, Color, PlaneUniforms, ShaderUniformSet, REVEAL_BANDS};
use serde::Deserialize;

/// The two sketch bootstraps. They share the pipeline but not their defaults or controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SketchVariant {
    /// Single progress slider on the plane, plain fill.
    #[default]
    Basic,
    /// Four staggered reveal bands, outline, timeline.
    Staged,
}

impl SketchVariant {
    /// Only the staged sketch animates its reveal bands; Basic is driven by its slider alone.
    pub fn has_reveal_timeline(self) -> bool {
        matches!(self, SketchVariant::Staged)
    }
}

/// Everything the debug panel can edit.
#[derive(Clone, Debug, PartialEq)]
pub struct SketchSettings {
    pub variant: SketchVariant,
    pub progress: [f32; REVEAL_BANDS],
    pub opacity: f32,
    pub alpha_test: f32,
    pub threshold: f32,
    pub color: Color,
    pub stroke_color: Color,
    pub reveal_colors: [Color; 2],
    pub stroke_outset_width: f32,
    pub stroke_inset_width: f32,
    pub reveal_softness: f32,
    pub noise_scale: f32,
    pub show_plane: bool,
    pub plane_progress: f32,
}

impl SketchSettings {
    pub fn for_variant(variant: SketchVariant) -> Self {
        let defaults = ShaderUniformSet::default();
        let base = Self {
            variant,
            progress: defaults.progress,
            opacity: defaults.opacity,
            alpha_test: defaults.alpha_test,
            threshold: defaults.threshold,
            color: Color::from_array(defaults.color),
            stroke_color: Color::from_array(defaults.stroke_color),
            reveal_colors: [mocha::MAUVE, mocha::PEACH],
            stroke_outset_width: defaults.stroke_outset_width,
            stroke_inset_width: defaults.stroke_inset_width,
            reveal_softness: defaults.reveal_softness,
            noise_scale: defaults.noise_scale,
            show_plane: false,
            plane_progress: 0.0,
        };

        match variant {
            // Fully revealed fill, no outline.
            SketchVariant::Basic => Self {
                stroke_outset_width: 0.0,
                stroke_inset_width: 0.0,
                ..base
            },
            // Starts hidden; the timeline reveals it.
            SketchVariant::Staged => Self {
                progress: [0.0; REVEAL_BANDS],
                color: mocha::TEXT,
                stroke_color: mocha::GREEN,
                ..base
            },
        }
    }

    pub fn to_uniforms(&self) -> ShaderUniformSet {
        ShaderUniformSet {
            color: self.color.to_array(),
            stroke_color: self.stroke_color.to_array(),
            reveal_colors: [
                self.reveal_colors[0].to_array(),
                self.reveal_colors[1].to_array(),
            ],
            progress: self.progress.map(|p| p.clamp(0.0, 1.0)),
            time: 0.0,
            opacity: self.opacity,
            threshold: self.threshold,
            alpha_test: self.alpha_test,
            stroke_outset_width: self.stroke_outset_width,
            stroke_inset_width: self.stroke_inset_width,
            reveal_softness: self.reveal_softness,
            noise_scale: self.noise_scale,
        }
    }

    pub fn plane_uniforms(&self, time: f32) -> PlaneUniforms {
        PlaneUniforms {
            time,
            progress: self.plane_progress,
            _padding: [0.0; 2],
        }
    }
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self::for_variant(SketchVariant::default())
    }
}

/// One slider: how to read the value and the observer that writes it back.
#[derive(Clone)]
pub struct SliderBinding {
    pub label: &'static str,
    pub range: RangeInclusive<f32>,
    pub step: f32,
    pub get: fn(&SketchSettings) -> f32,
    pub set: fn(&mut SketchSettings, f32),
}

impl SliderBinding {
    pub fn new(
        label: &'static str,
        range: RangeInclusive<f32>,
        step: f32,
        get: fn(&SketchSettings) -> f32,
        set: fn(&mut SketchSettings, f32),
    ) -> Self {
        Self {
            label,
            range,
            step,
            get,
            set,
        }
    }

    pub fn value(&self, settings: &SketchSettings) -> f32 {
        (self.get)(settings)
    }

    /// Clamp and snap `value`, then notify `set` if it differs from the current value.
    /// Returns whether the settings changed.
    pub fn apply(&self, settings: &mut SketchSettings, value: f32) -> bool {
        let (min, max) = (*self.range.start(), *self.range.end());
        let mut value = value.clamp(min, max);
        if self.step > 0.0 {
            value = (min + ((value - min) / self.step).round() * self.step).clamp(min, max);
        }

        if value == self.value(settings) {
            return false;
        }

        (self.set)(settings, value);
        log::trace!("{} -> {value}", self.label);
        true
    }
}

/// A titled group of sliders, shown as one panel section.
#[derive(Clone)]
pub struct ControlSection {
    pub title: &'static str,
    pub sliders: Vec<SliderBinding>,
    /// Show the "Play reveal" trigger under the sliders.
    pub reveal_trigger: bool,
}

/// Bindings for a variant, built once at startup.
pub fn control_sections(variant: SketchVariant) -> Vec<ControlSection> {
    let rendering = ControlSection {
        title: "Rendering",
        sliders: vec![
            SliderBinding::new("Opacity", 0.0..=1.0, 0.01, |s| s.opacity, |s, v| s.opacity = v),
            SliderBinding::new(
                "Alpha Test",
                0.0..=1.0,
                0.01,
                |s| s.alpha_test,
                |s, v| s.alpha_test = v,
            ),
            SliderBinding::new(
                "Threshold",
                0.0..=0.5,
                0.01,
                |s| s.threshold,
                |s, v| s.threshold = v,
            ),
        ],
        reveal_trigger: false,
    };

    match variant {
        SketchVariant::Basic => vec![
            ControlSection {
                title: "Settings",
                sliders: vec![SliderBinding::new(
                    "progress",
                    0.0..=1.0,
                    0.01,
                    |s| s.plane_progress,
                    |s, v| s.plane_progress = v,
                )],
                reveal_trigger: false,
            },
            rendering,
        ],
        SketchVariant::Staged => vec![
            ControlSection {
                title: "Reveal",
                sliders: vec![
                    SliderBinding::new(
                        "Band 1",
                        0.0..=1.0,
                        0.01,
                        |s| s.progress[0],
                        |s, v| s.progress[0] = v,
                    ),
                    SliderBinding::new(
                        "Band 2",
                        0.0..=1.0,
                        0.01,
                        |s| s.progress[1],
                        |s, v| s.progress[1] = v,
                    ),
                    SliderBinding::new(
                        "Band 3",
                        0.0..=1.0,
                        0.01,
                        |s| s.progress[2],
                        |s, v| s.progress[2] = v,
                    ),
                    SliderBinding::new(
                        "Band 4",
                        0.0..=1.0,
                        0.01,
                        |s| s.progress[3],
                        |s, v| s.progress[3] = v,
                    ),
                    SliderBinding::new(
                        "Softness",
                        0.001..=0.3,
                        0.001,
                        |s| s.reveal_softness,
                        |s, v| s.reveal_softness = v,
                    ),
                    SliderBinding::new(
                        "Noise Scale",
                        1.0..=40.0,
                        0.5,
                        |s| s.noise_scale,
                        |s, v| s.noise_scale = v,
                    ),
                ],
                reveal_trigger: true,
            },
            ControlSection {
                title: "Strokes",
                sliders: vec![
                    SliderBinding::new(
                        "Outset Width",
                        0.0..=1.0,
                        0.01,
                        |s| s.stroke_outset_width,
                        |s, v| s.stroke_outset_width = v,
                    ),
                    SliderBinding::new(
                        "Inset Width",
                        0.0..=1.0,
                        0.01,
                        |s| s.stroke_inset_width,
                        |s, v| s.stroke_inset_width = v,
                    ),
                ],
                reveal_trigger: false,
            },
            ControlSection {
                title: "Plane",
                sliders: vec![SliderBinding::new(
                    "Plane Progress",
                    0.0..=1.0,
                    0.01,
                    |s| s.plane_progress,
                    |s, v| s.plane_progress = v,
                )],
                reveal_trigger: false,
            },
            rendering,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn find(sections: &[ControlSection], label: &str) -> SliderBinding {
        sections
            .iter()
            .flat_map(|s| s.sliders.iter())
            .find(|b| b.label == label)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_basic_preset_is_plain_fill() {
        let settings = SketchSettings::for_variant(SketchVariant::Basic);
        let uniforms = settings.to_uniforms();
        assert!(!uniforms.strokes_enabled());
        assert_eq!(uniforms.progress, [1.0; 4]);
        assert_eq!(uniforms.threshold, 0.05);
        assert_eq!(uniforms.alpha_test, 0.01);
        assert!(!settings.show_plane);
    }

    #[test]
    fn test_staged_preset_starts_hidden_with_strokes() {
        let uniforms = SketchSettings::for_variant(SketchVariant::Staged).to_uniforms();
        assert!(uniforms.strokes_enabled());
        assert_eq!(uniforms.progress, [0.0; 4]);
    }

    #[test]
    fn test_to_uniforms_clamps_progress() {
        let mut settings = SketchSettings::default();
        settings.progress = [-1.0, 0.5, 2.0, 1.0];
        assert_eq!(settings.to_uniforms().progress, [0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_slider_writes_through_observer() {
        let sections = control_sections(SketchVariant::Staged);
        let band = find(&sections, "Band 2");

        let mut settings = SketchSettings::for_variant(SketchVariant::Staged);
        assert!(band.apply(&mut settings, 0.5));
        assert_relative_eq!(settings.progress[1], 0.5);
        assert_relative_eq!(settings.to_uniforms().progress[1], 0.5);
        // Other bands untouched.
        assert_eq!(settings.progress[0], 0.0);
    }

    #[test]
    fn test_unchanged_value_does_not_notify() {
        let sections = control_sections(SketchVariant::Basic);
        let opacity = find(&sections, "Opacity");

        let mut settings = SketchSettings::default();
        assert!(!opacity.apply(&mut settings, 1.0));
        assert!(!opacity.apply(&mut settings, 5.0));
        assert!(opacity.apply(&mut settings, 0.25));
    }

    #[test]
    fn test_slider_snaps_to_step() {
        let sections = control_sections(SketchVariant::Basic);
        let progress = find(&sections, "progress");

        let mut settings = SketchSettings::default();
        progress.apply(&mut settings, 0.333);
        assert_relative_eq!(settings.plane_progress, 0.33, epsilon = 1e-6);
    }

    #[test]
    fn test_basic_panel_has_single_progress_slider() {
        let sections = control_sections(SketchVariant::Basic);
        let progress_sliders = sections
            .iter()
            .flat_map(|s| s.sliders.iter())
            .filter(|b| b.label.to_lowercase().contains("progress") || b.label.starts_with("Band"))
            .count();
        assert_eq!(progress_sliders, 1);
    }

    #[test]
    fn test_only_staged_runs_the_reveal_timeline() {
        assert!(!SketchVariant::Basic.has_reveal_timeline());
        assert!(SketchVariant::Staged.has_reveal_timeline());

        // The panel trigger follows the same rule.
        for variant in [SketchVariant::Basic, SketchVariant::Staged] {
            let has_trigger = control_sections(variant).iter().any(|s| s.reveal_trigger);
            assert_eq!(has_trigger, variant.has_reveal_timeline());
        }
    }

    #[test]
    fn test_staged_panel_has_four_bands() {
        let sections = control_sections(SketchVariant::Staged);
        let bands = sections
            .iter()
            .flat_map(|s| s.sliders.iter())
            .filter(|b| b.label.starts_with("Band"))
            .count();
        assert_eq!(bands, 4);
    }
}
